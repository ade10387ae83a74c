use anyhow::{anyhow, Context, Result};
use std::process::{Command, Stdio};

/// Hand a URL to the platform's default browser. Fire and forget: we only
/// check that the opener could be started.
pub fn open_url(url: &str) -> Result<()> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(anyhow!("Refusing to open non-web URL: {}", url));
    }

    let mut cmd = opener_command(url);
    let program = cmd.get_program().to_string_lossy().into_owned();
    cmd.stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to run '{}' to open {}", program, url))?;
    tracing::info!(url, "opened apply link");
    Ok(())
}

fn opener_command(url: &str) -> Command {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        // Not `cmd /C start`: cmd would re-parse `&`, `|` and `^` inside the URL.
        let mut cmd = Command::new("rundll32");
        cmd.arg("url.dll,FileProtocolHandler");
        cmd
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(url);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_web_urls() {
        let err = open_url("file:///etc/passwd").unwrap_err();
        assert!(err.to_string().contains("non-web URL"));
        assert!(open_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_url_is_passed_as_one_argument() {
        let url = "https://careers.example.com/jobs?a=1&b=2|x^y&calc";
        let cmd = opener_command(url);
        assert_ne!(cmd.get_program(), "cmd");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args.last().copied(), Some(std::ffi::OsStr::new(url)));
        assert_eq!(args.iter().filter(|a| a.to_string_lossy().contains('&')).count(), 1);
    }
}
