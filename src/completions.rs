use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap_complete::{generate, Shell};

use crate::app::AppError;

const BIN_NAME: &str = "wkp";

pub fn generate_completions(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = crate::cli::styled_command();
    generate(shell, &mut cmd, BIN_NAME, buf);
}

pub fn detect_current_shell() -> Option<Shell> {
    shell_from_path(&std::env::var("SHELL").ok()?)
}

fn shell_from_path(shell_var: &str) -> Option<Shell> {
    parse_shell(shell_var.rsplit('/').next()?)
}

fn parse_shell(raw: &str) -> Option<Shell> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "bash" => Some(Shell::Bash),
        "zsh" => Some(Shell::Zsh),
        "fish" => Some(Shell::Fish),
        "elvish" => Some(Shell::Elvish),
        "powershell" | "pwsh" => Some(Shell::PowerShell),
        _ => None,
    }
}

fn install_path_for_home(shell: Shell, home: &Path) -> Option<PathBuf> {
    match shell {
        Shell::Bash => Some(home.join(".local/share/bash-completion/completions").join(BIN_NAME)),
        Shell::Zsh => Some(home.join(".config/weekplan/completions").join("wkp.zsh")),
        Shell::Fish => Some(home.join(".config/fish/completions").join("wkp.fish")),
        _ => None,
    }
}

pub fn install_completions(shell: Shell) -> io::Result<PathBuf> {
    let home = std::env::var("HOME").map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
    install_completions_into(shell, Path::new(&home))
}

fn install_completions_into(shell: Shell, home: &Path) -> io::Result<PathBuf> {
    let path = install_path_for_home(shell, home).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no install path for {shell:?}"),
        )
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut buf = Vec::new();
    generate_completions(shell, &mut buf);
    std::fs::write(&path, buf)?;

    if shell == Shell::Zsh {
        source_from_zshrc(home, &path)?;
    }
    Ok(path)
}

/// Appends a `source` line to `~/.zshrc` once.
fn source_from_zshrc(home: &Path, completions_path: &Path) -> io::Result<()> {
    let zshrc = home.join(".zshrc");
    let source_line = format!("source \"{}\"", completions_path.display());

    if zshrc.exists() && std::fs::read_to_string(&zshrc)?.contains(&source_line) {
        return Ok(());
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&zshrc)?;
    writeln!(file)?;
    writeln!(file, "# {BIN_NAME} shell completions")?;
    writeln!(file, "{source_line}")?;
    Ok(())
}

pub fn run_completions_command(shell_arg: Option<&str>, install: bool) -> Result<(), AppError> {
    let shell = match shell_arg {
        Some(name) => parse_shell(name)
            .ok_or_else(|| AppError::InvalidArgument(format!("unknown shell '{name}'")))?,
        None => detect_current_shell().ok_or_else(|| {
            AppError::InvalidArgument(
                "unable to detect shell from $SHELL; pass a shell name".to_string(),
            )
        })?,
    };

    if install {
        let path = install_completions(shell)?;
        println!("completions installed to {}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        generate_completions(shell, &mut stdout);
    }
    Ok(())
}
