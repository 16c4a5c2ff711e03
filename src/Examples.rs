pub mod cascade_examples;
