//! Chromium command-line options and configuration.
//!
//! Provides a type-safe interface for configuring browser process options
//! such as headless mode, window size, and other command-line arguments.
//!
//! # Example
//!
//! ```ignore
//! use court_reserver::ChromeOptions;
//!
//! let options = ChromeOptions::new()
//!     .with_headless()
//!     .with_window_size(1280, 900);
//!
//! let args = options.to_args();
//! // ["--headless=new", "--window-size=1280,900"]
//! ```

// ============================================================================
// ChromeOptions
// ============================================================================

/// Browser process configuration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromeOptions {
    /// Run without a visible window.
    pub headless: bool,

    /// Window dimensions in pixels (width, height).
    pub window_size: Option<(u32, u32)>,

    /// Additional custom command-line arguments.
    pub extra_args: Vec<String>,
}

// ============================================================================
// Constructors
// ============================================================================

impl ChromeOptions {
    /// Creates a new options instance with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            headless: false,
            window_size: None,
            extra_args: Vec::new(),
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ChromeOptions {
    /// Enables headless mode.
    #[inline]
    #[must_use]
    pub fn with_headless(mut self) -> Self {
        self.headless = true;
        self
    }

    /// Sets window size in pixels.
    #[inline]
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    /// Adds a custom command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl ChromeOptions {
    /// Converts options to browser command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4 + self.extra_args.len());

        if self.headless {
            args.push("--headless=new".to_string());
        }

        if let Some((width, height)) = self.window_size {
            args.push(format!("--window-size={width},{height}"));
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if let Some((width, height)) = self.window_size
            && (width == 0 || height == 0)
        {
            return Err("Window dimensions must be greater than zero".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_default() {
        let options = ChromeOptions::new();
        assert!(!options.headless);
        assert!(options.window_size.is_none());
        assert!(options.extra_args.is_empty());
        assert!(options.to_args().is_empty());
    }

    #[test]
    fn test_to_args_all_options() {
        let args = ChromeOptions::new()
            .with_headless()
            .with_window_size(1280, 900)
            .with_arg("--disable-gpu")
            .to_args();

        assert_eq!(args, vec!["--headless=new", "--window-size=1280,900", "--disable-gpu"]);
    }

    #[test]
    fn test_validate_zero_width() {
        let options = ChromeOptions::new().with_window_size(0, 600);
        assert!(options.validate().is_err());
        assert!(ChromeOptions::new().with_window_size(800, 600).validate().is_ok());
    }
}
