// src/ai_bootstrap.rs
use crate::analyze::ai_adapter::{build_enhancer, DynAiEnhancer};
use crate::config::ai::AiConfig;
use tracing::{info, warn};

/// Load `path` and build the enhancer. Any problem (missing file, missing key,
/// disabled) yields `None` and the heuristic path is used alone.
pub fn enhancer_from_path(path: &str) -> Option<DynAiEnhancer> {
    let cfg = match AiConfig::load_from_file(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, path, "AI config unavailable; using heuristic scoring only");
            return None;
        }
    };
    // Safe diagnostics: only provider + enabled + key length
    info!(
        "AI cfg loaded: provider={}, enabled={}, key_len={}",
        cfg.provider,
        cfg.enabled,
        cfg.api_key.len()
    );
    build_enhancer(&cfg)
}
