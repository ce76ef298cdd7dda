/// logger setup for the binary: simplelog terminal logger plus optional log file
pub mod logging;
