// src/supabase/mod.rs
pub mod checks;
pub mod client;
pub mod config;

pub use checks::run_all;
pub use config::SupabaseConfig;
