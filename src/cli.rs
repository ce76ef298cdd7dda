/// interactive text menu over stdin/stdout
pub mod cli_main;
