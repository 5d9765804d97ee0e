use serde::{Deserialize, Serialize};

/// Supported operating system families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
}

impl Platform {
    /// Detect the current platform
    ///
    /// Unix flavours that are neither macOS nor Linux share Linux's install
    /// layout closely enough to be probed as Linux.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Get the display name for the platform
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::MacOS => "macOS",
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
        }
    }

    /// File suffixes tried when looking for an executable by bare name
    ///
    /// Windows consults `PATHEXT` before the bare name; everywhere else the
    /// bare name is the file.
    pub fn executable_suffixes(&self) -> Vec<String> {
        match self {
            Platform::Windows => {
                let pathext = std::env::var("PATHEXT")
                    .unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
                // The bare name goes last: npm ships an extensionless sh script
                // next to npm.cmd that Windows cannot launch
                let mut suffixes: Vec<String> = pathext
                    .split(';')
                    .map(str::trim)
                    .filter(|ext| !ext.is_empty())
                    .map(|ext| ext.to_ascii_lowercase())
                    .collect();
                suffixes.push(String::new());
                suffixes
            }
            Platform::MacOS | Platform::Linux => vec![String::new()],
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
