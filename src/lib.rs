//! modpack-translate - In-place translation of modpack text assets
//! 
//! Walks a modpack folder, finds Chinese phrases embedded in config, script and data
//! files, translates each distinct phrase once through MyMemory and writes the files back
//! with only those phrases replaced.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod rewrite;
pub mod translate;
pub mod workflow;
