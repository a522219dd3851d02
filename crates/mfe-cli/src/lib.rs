//! Library side of the `mfe` binary: argument parsing, commands and
//! output rendering over a [`ProfileCache`](mfe_profiles::ProfileCache).

pub mod cli;
pub mod commands;
pub mod output;
