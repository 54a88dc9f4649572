use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Vitaplan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    "info,vitaplan=debug".to_string()
}

/// Get the application data directory
/// ~/Vitaplan/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Vitaplan")
}

/// Path of the on-disk plan database
pub fn database_path() -> PathBuf {
    app_data_dir().join("vitaplan.db")
}

/// Base URL of the local Ollama instance (VITAPLAN_OLLAMA_URL override)
pub fn ollama_base_url() -> String {
    std::env::var("VITAPLAN_OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string())
}

/// Model used for report analysis and plan generation (VITAPLAN_MODEL override)
pub fn ollama_model() -> String {
    std::env::var("VITAPLAN_MODEL").unwrap_or_else(|_| "medgemma:latest".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Vitaplan"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("vitaplan.db"));
    }

    #[test]
    fn app_name_is_vitaplan() {
        assert_eq!(APP_NAME, "Vitaplan");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }

    #[test]
    fn log_filter_covers_crate() {
        assert!(default_log_filter().contains("vitaplan"));
    }
}
