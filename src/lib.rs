#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod PoreReactor;
#[allow(non_snake_case)]
pub mod Utils;
