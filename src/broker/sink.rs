//! Navigation delivery — sending the browser to a bound URL.
//!
//! The listener decides *what* to open; a [`Navigator`] supplied by the
//! host decides *how*. [`CommandNavigator`] hands the URL to an external
//! opener program, the way a desktop host would.

use std::future::Future;
use std::process::Stdio;

use crate::model::Binding;

/// Where the bound URL opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Replace the current page.
    Current,
    /// A new background tab; the current page stays put.
    NewTab,
}

/// A resolved navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub url: String,
    pub target: Target,
}

impl From<&Binding> for Navigation {
    fn from(binding: &Binding) -> Self {
        Self {
            url: binding.url.clone(),
            target: if binding.open_in_new_tab {
                Target::NewTab
            } else {
                Target::Current
            },
        }
    }
}

/// Navigation delivery failure.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("opener `{program}` failed to start: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("opener `{program}` exited with {status}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
    },
}

/// Host primitive that performs a navigation.
pub trait Navigator: Send + Sync {
    fn navigate(
        &self,
        navigation: &Navigation,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Opens URLs by spawning an external program (`xdg-open`, a browser
/// binary, ...). Extra arguments per target go before the URL.
#[derive(Debug, Clone)]
pub struct CommandNavigator {
    program: String,
    current_args: Vec<String>,
    new_tab_args: Vec<String>,
}

impl CommandNavigator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            current_args: Vec::new(),
            new_tab_args: Vec::new(),
        }
    }

    pub fn with_current_args(mut self, args: Vec<String>) -> Self {
        self.current_args = args;
        self
    }

    pub fn with_new_tab_args(mut self, args: Vec<String>) -> Self {
        self.new_tab_args = args;
        self
    }
}

impl Navigator for CommandNavigator {
    async fn navigate(&self, navigation: &Navigation) -> Result<(), SinkError> {
        let args = match navigation.target {
            Target::Current => &self.current_args,
            Target::NewTab => &self.new_tab_args,
        };
        deliver_open(&self.program, args, &navigation.url).await
    }
}

/// Spawn `program args... url` and wait for it to exit.
///
/// The opener's output is discarded; only the exit status matters.
pub async fn deliver_open(program: &str, args: &[String], url: &str) -> Result<(), SinkError> {
    use tokio::process::Command;

    let status = Command::new(program)
        .args(args)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|source| SinkError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if status.success() {
        tracing::info!(program, url, "navigation delivered");
        Ok(())
    } else {
        Err(SinkError::Exit {
            program: program.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BindingId, Candidate};

    #[test]
    fn binding_target_follows_new_tab_flag() {
        let binding = Candidate::new("https://a.example", "g", "*")
            .new_tab(true)
            .validate()
            .unwrap()
            .into_binding(BindingId::new());
        let navigation = Navigation::from(&binding);
        assert_eq!(navigation.target, Target::NewTab);
        assert_eq!(navigation.url, "https://a.example");

        let binding = Binding {
            open_in_new_tab: false,
            ..binding
        };
        assert_eq!(Navigation::from(&binding).target, Target::Current);
    }

    #[tokio::test]
    async fn opener_success() {
        let navigator = CommandNavigator::new("true");
        let navigation = Navigation {
            url: "https://a.example".into(),
            target: Target::Current,
        };
        navigator.navigate(&navigation).await.unwrap();
    }

    #[tokio::test]
    async fn opener_nonzero_exit() {
        let navigator = CommandNavigator::new("false");
        let navigation = Navigation {
            url: "https://a.example".into(),
            target: Target::NewTab,
        };
        let result = navigator.navigate(&navigation).await;
        assert!(matches!(result, Err(SinkError::Exit { .. })));
    }

    #[tokio::test]
    async fn opener_missing() {
        let result = deliver_open("/nonexistent/opener", &[], "https://a.example").await;
        assert!(matches!(result, Err(SinkError::Spawn { .. })));
    }
}
