use PoreCascade::Examples::cascade_examples::cascade_examples;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

pub fn main() {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    // 0 - single topology, 1 - co-immobilization with decay, 2 - enzyme ratio sweep
    let task: usize = 0;
    cascade_examples(task);
}
