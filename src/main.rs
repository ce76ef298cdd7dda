use ChemCalc::Calculator::dispatcher::evaluate_json;
use ChemCalc::Utils::logging::init_logger;
use ChemCalc::cli::cli_main::run_interactive_menu;
use ChemCalc::settings::{CalcSettings, DEFAULT_CONFIG_FILE};
use std::env;
use std::process::ExitCode;

/// usage:
///   ChemCalc                      interactive menu
///   ChemCalc --json '<request>'   evaluate one JSON request and print the JSON result
///   ChemCalc --config <file> ...  use another configuration file
pub fn main() -> ExitCode {
    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut config_file = DEFAULT_CONFIG_FILE.to_string();
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        if pos + 1 < args.len() {
            config_file = args.remove(pos + 1);
        }
        args.remove(pos);
    }
    let settings = CalcSettings::load_or_default(&config_file);

    if let Some(pos) = args.iter().position(|a| a == "--json") {
        // JSON mode keeps stdout clean
        let Some(request) = args.get(pos + 1) else {
            eprintln!("--json requires a request");
            return ExitCode::FAILURE;
        };
        let result = evaluate_json(request, &settings);
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        }
        return if result.is_error() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    init_logger(&settings);
    match run_interactive_menu(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
