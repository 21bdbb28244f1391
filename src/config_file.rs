use anyhow::{anyhow, Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_FILE: &str = ".serialblocksrc";
const MAX_ALIAS_DEPTH: usize = 10;

/// Defaults and aliases read from INI configuration files
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub defaults: Option<String>,
    pub aliases: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Find a project-level `.serialblocksrc` by walking up from `start`
    pub fn find_project_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(PROJECT_FILE))
            .find(|path| path.is_file())
    }

    /// User config file locations in order of preference
    pub fn user_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("serialblocks").join("config.ini"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(PROJECT_FILE));
        }
        paths
    }

    /// Load with precedence project > user; a missing file is not an error
    pub fn load() -> Result<Self> {
        let cwd = env::current_dir().context("Failed to determine current directory")?;
        Self::load_from(Self::find_project_config(&cwd), &Self::user_config_paths())
    }

    /// Load an explicit file (`--config-file`) or fall back to the search
    pub fn load_with_custom_path(custom_path: Option<&str>) -> Result<Self> {
        match custom_path {
            Some(path) => Self::load_from_path(Path::new(path)),
            None => Self::load(),
        }
    }

    fn load_from(project: Option<PathBuf>, user_paths: &[PathBuf]) -> Result<Self> {
        let mut config = Self::default();

        // First existing user file, lowest precedence
        if let Some(path) = user_paths.iter().find(|p| p.is_file()) {
            config = config.merge(Self::load_from_path(path)?);
        }
        if let Some(path) = project {
            config = config.merge(Self::load_from_path(&path)?);
        }

        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Ok(Self::parse_ini_content(&content))
    }

    /// Parse INI text; unknown keys and sections are ignored
    fn parse_ini_content(content: &str) -> Self {
        let mut config = Self::default();
        let mut section = String::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_string();
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            match section.as_str() {
                "" if key == "defaults" => config.defaults = Some(value.to_string()),
                "aliases" => {
                    config.aliases.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        config
    }

    /// Overlay `other` on top of `self`
    fn merge(mut self, other: Self) -> Self {
        if other.defaults.is_some() {
            self.defaults = other.defaults;
        }
        self.aliases.extend(other.aliases);
        self
    }

    /// Human readable report for `--show-config`
    pub fn describe() -> String {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project = Self::find_project_config(&cwd);
        let user_paths = Self::user_config_paths();
        let mut out = String::from(
            "Configuration precedence: CLI > project .serialblocksrc > user config > defaults\n\n",
        );

        match Self::load_from(project.clone(), &user_paths) {
            Ok(config) if config == Self::default() => {
                out.push_str("No configuration values active. Using defaults.\n");
            }
            Ok(config) => {
                if let Some(defaults) = &config.defaults {
                    out.push_str(&format!("Active defaults:\n  defaults = {}\n", defaults));
                }
                if !config.aliases.is_empty() {
                    out.push_str("Active aliases:\n");
                    for (name, value) in &config.aliases {
                        out.push_str(&format!("  {} = {}\n", name, value));
                    }
                }
            }
            Err(e) => out.push_str(&format!("Error loading configuration: {:#}\n", e)),
        }

        out.push_str("\nConfiguration search locations (in precedence order):\n");
        match &project {
            Some(path) => out.push_str(&format!("  1. Project: {} (found)\n", path.display())),
            None => out.push_str(&format!(
                "  1. Project: {} (searched up directory tree, not found)\n",
                PROJECT_FILE
            )),
        }
        for (i, path) in user_paths.iter().enumerate() {
            let status = if path.is_file() { "found" } else { "not found" };
            out.push_str(&format!("  {}. User: {} ({})\n", i + 2, path.display(), status));
        }

        if project.is_none() && !user_paths.iter().any(|p| p.is_file()) {
            out.push_str("\nExample configuration file (.serialblocksrc):\n\n");
            out.push_str("# Arguments applied to every serialblocks command\n");
            out.push_str("defaults = --stats --on-error summary\n\n");
            out.push_str("[aliases]\n");
            out.push_str("excel = --delimiter ';' --header yes\n");
            out.push_str("export = --output-format csv --quiet\n");
        }

        out
    }

    /// Expand one alias, following `-a name` references inside it
    pub fn resolve_alias(
        &self,
        name: &str,
        seen: &mut HashSet<String>,
        depth: usize,
    ) -> Result<Vec<String>> {
        if depth > MAX_ALIAS_DEPTH {
            return Err(anyhow!("Alias chain too deep: {} levels", depth));
        }
        if !seen.insert(name.to_string()) {
            return Err(anyhow!("Circular dependency detected in alias: {}", name));
        }

        let value = self
            .aliases
            .get(name)
            .ok_or_else(|| anyhow!("Unknown alias: {}", name))?;
        let args = shell_words::split(value)
            .with_context(|| format!("Invalid alias '{}': failed to parse arguments", name))?;

        let expanded = self.expand_aliases(args, seen, depth + 1)?;
        seen.remove(name);
        Ok(expanded)
    }

    fn expand_aliases(
        &self,
        args: Vec<String>,
        seen: &mut HashSet<String>,
        depth: usize,
    ) -> Result<Vec<String>> {
        let mut result = Vec::with_capacity(args.len());
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            if arg == "-a" || arg == "--alias" {
                match iter.next() {
                    Some(name) => result.extend(self.resolve_alias(&name, seen, depth)?),
                    None => result.push(arg),
                }
            } else if let Some(name) = arg.strip_prefix("--alias=") {
                result.extend(self.resolve_alias(name, seen, depth)?);
            } else {
                result.push(arg);
            }
        }
        Ok(result)
    }

    /// Prepend `defaults` after the program name, then expand aliases
    pub fn process_args(&self, args: Vec<String>) -> Result<Vec<String>> {
        let mut args = args.into_iter();
        let mut result: Vec<String> = args.next().into_iter().collect();

        if let Some(defaults) = &self.defaults {
            let default_args = shell_words::split(defaults)
                .context("Invalid defaults: failed to parse arguments")?;
            result.extend(default_args);
        }
        result.extend(args);

        self.expand_aliases(result, &mut HashSet::new(), 0)
    }
}
