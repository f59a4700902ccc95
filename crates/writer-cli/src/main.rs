use anyhow::{Context, Result, bail};
use std::io::{self, Read};
use std::path::PathBuf;
use std::{env, fs, process};
use writer_config::EditorConfig;
use writer_engine::{EditingHost, Editor, HostProfile, MemoryHost};

mod script;

use script::ScriptRunner;

const USAGE: &str = "Usage: writer-cli [--config <path>] [--html <file>] [--profile <plain|chromium|gecko>] <script|->";

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    html: Option<PathBuf>,
    profile: HostProfile,
    script: String,
}

fn parse_profile(name: &str) -> Result<HostProfile> {
    Ok(match name {
        "plain" => HostProfile::default(),
        "chromium" => HostProfile::chromium(),
        "gecko" => HostProfile::gecko(),
        other => bail!("unknown host profile {other:?}"),
    })
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut script = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--html" => {
                let path = args.next().context("--html needs a file")?;
                parsed.html = Some(PathBuf::from(path));
            }
            "--profile" => {
                let name = args.next().context("--profile needs a name")?;
                parsed.profile = parse_profile(&name)?;
            }
            _ if script.is_none() => script = Some(arg),
            _ => bail!("unexpected argument {arg:?}"),
        }
    }
    parsed.script = script.context("no script given")?;
    Ok(parsed)
}

fn load_config(path: Option<&PathBuf>) -> Result<EditorConfig> {
    match path {
        Some(path) => {
            let path = EditorConfig::expand_path(path)
                .with_context(|| format!("cannot expand config path {}", path.display()))?;
            EditorConfig::load_from_path(&path)?
                .with_context(|| format!("config file {} does not exist", path.display()))
        }
        None => {
            let config = EditorConfig::load()?;
            if config.is_none() {
                log::info!(
                    "No config at {}, using defaults",
                    EditorConfig::config_path().display()
                );
            }
            Ok(config.unwrap_or_default())
        }
    }
}

fn read_script(source: &str) -> Result<String> {
    if source == "-" {
        let mut script = String::new();
        io::stdin().read_to_string(&mut script)?;
        return Ok(script);
    }
    fs::read_to_string(source).with_context(|| format!("reading script {source}"))
}

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = load_config(args.config.as_ref())?;
    let script = read_script(&args.script)?;

    let host = MemoryHost::from_html("<div class=\"editor\"></div>", args.profile)?;
    let mut editor = Editor::create(host, ".editor", config)?;

    if let Some(path) = &args.html {
        let html = fs::read_to_string(path)
            .with_context(|| format!("reading html {}", path.display()))?;
        let region = editor.region();
        let tree = editor.host_mut().document_mut();
        tree.set_inner_html(region, html.trim())?;
        tree.take_insertions();
        log::info!("Loaded region content from {}", path.display());
    }

    let stdout = io::stdout();
    let mut runner = ScriptRunner::new(editor, stdout.lock());
    runner.run(&script)?;
    println!("{}", runner.editor().html());
    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        eprintln!("{USAGE}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_all_options() {
        let parsed = parse_args(args(&[
            "--config", "c.toml", "--html", "in.html", "--profile", "gecko", "edit.txt",
        ]))
        .unwrap();

        assert_eq!(
            parsed,
            Args {
                config: Some(PathBuf::from("c.toml")),
                html: Some(PathBuf::from("in.html")),
                profile: HostProfile::gecko(),
                script: "edit.txt".into(),
            }
        );
    }

    #[test]
    fn script_is_required() {
        assert!(parse_args(args(&["--profile", "plain"])).is_err());
    }

    #[test]
    fn second_script_is_rejected() {
        assert!(parse_args(args(&["a.txt", "b.txt"])).is_err());
    }

    #[test]
    fn unknown_profile_is_rejected() {
        assert!(parse_args(args(&["--profile", "trident", "a.txt"])).is_err());
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn unexpandable_config_path_is_rejected() {
        let path = PathBuf::from("$WRITER_CLI_UNSET_VARIABLE/config.toml");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("cannot expand"), "{err:#}");
    }

    #[test]
    fn explicit_config_is_merged_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "placeholder = \"Hello\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.placeholder, "Hello");
        assert_eq!(config.header1, EditorConfig::default().header1);
    }
}
