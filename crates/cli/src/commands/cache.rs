use super::GlobalOptions;
use clap::Subcommand;
use lampsmith_cache::BuildCache;
use lampsmith_core::Result;
use lampsmith_task::discover;
use std::collections::HashSet;

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cached script hashes
    Show,
    /// Delete the cache file so every script is rebuilt
    Clear,
    /// Drop entries for scripts that no longer exist
    Prune,
}

impl CacheCommands {
    pub fn execute(self, globals: &GlobalOptions) -> Result<()> {
        let config = globals.loader().interactive(false).load()?;

        match self {
            CacheCommands::Show => {
                let cache = BuildCache::load(&config.cache_file);
                if cache.is_empty() {
                    println!("Cache is empty ({})", config.cache_file.display());
                    return Ok(());
                }
                for (script, entry) in cache.entries() {
                    let hash = entry.hash.as_deref().map_or_else(|| "-".to_string(), short_hash);
                    let when = entry
                        .last_processed
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{script:<32} {hash:<12} {when}");
                }
                Ok(())
            }
            CacheCommands::Clear => {
                if BuildCache::clear(&config.cache_file)? {
                    println!("✓ Cache cleared");
                } else {
                    println!("No cache file at {}", config.cache_file.display());
                }
                Ok(())
            }
            CacheCommands::Prune => {
                let present: HashSet<String> = discover(&config.working_directory)?
                    .iter()
                    .map(|entry| entry.filename().to_string())
                    .collect();

                let mut cache = BuildCache::load(&config.cache_file);
                let removed = cache.prune(|script| present.contains(script));
                if removed.is_empty() {
                    println!("✓ Nothing to prune");
                    return Ok(());
                }

                cache.save()?;
                for script in &removed {
                    println!("  removed {script}");
                }
                println!("✓ Pruned {} stale cache entries", removed.len());
                Ok(())
            }
        }
    }
}

/// First characters of a digest for display, safe on any UTF-8 content
fn short_hash(hash: &str) -> String {
    hash.chars().take(SHORT_HASH_LEN).collect()
}

const SHORT_HASH_LEN: usize = 12;
