use mm_core::layout::{LayoutConfig, resolve_layout};
use mm_core::model::Diagram;
use mm_core::outline::{emit_outline, parse_outline};
use mm_core::snapshot::{self, Snapshot};
use mm_render::{SvgOptions, Theme, render_svg};
use serde::Serialize;
use std::io::{Read, Write};
use std::str::FromStr;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Snapshot(mm_core::Error),
    Outline(String),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Snapshot(err) => write!(f, "{err}"),
            CliError::Outline(msg) => write!(f, "outline error: {msg}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<mm_core::Error> for CliError {
    fn from(value: mm_core::Error) -> Self {
        Self::Snapshot(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Command {
    #[default]
    Layout,
    Render,
    Convert,
    Validate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum Format {
    #[default]
    Json,
    Outline,
    Msgpack,
}

impl FromStr for Format {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "outline" | "txt" => Ok(Self::Outline),
            "msgpack" | "mpk" => Ok(Self::Msgpack),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    out: Option<String>,
    pretty: bool,
    config_path: Option<String>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    h_spacing: Option<f32>,
    v_spacing: Option<f32>,
    padding: Option<f32>,
    theme: Theme,
    fit: bool,
    width: Option<f32>,
    height: Option<f32>,
    to: Format,
}

/// `layout` output: the snapshot with coordinates plus the connectors.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOut<'a> {
    #[serde(flatten)]
    snapshot: Snapshot,
    connectors: &'a [mm_core::Connector],
    config: LayoutConfig,
}

fn usage() -> &'static str {
    "mm-cli\n\
\n\
USAGE:\n\
  mm-cli layout [--pretty] [LAYOUT OPTIONS] [<path>|-]\n\
  mm-cli render [--theme light|dark] [--fit] [--width <px>] [--height <px>] [--out <path>] [LAYOUT OPTIONS] [<path>|-]\n\
  mm-cli convert --to json|outline|msgpack [--pretty] [--out <path>] [<path>|-]\n\
  mm-cli validate [<path>|-]\n\
\n\
LAYOUT OPTIONS:\n\
  --config <file.json>   layout config (nodeWidth, nodeHeight, horizontalSpacing, verticalSpacing, padding)\n\
  --node-width <n>  --node-height <n>  --h-spacing <n>  --v-spacing <n>  --padding <n>\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input may be a JSON snapshot, a MessagePack snapshot, or an indented outline.\n\
  - render uses the snapshot's view window unless --fit is given.\n\
  - Set RUST_LOG=debug for diagnostics on stderr.\n\
"
}

fn next_f32<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<f32, CliError> {
    let Some(raw) = it.next() else {
        return Err(CliError::Usage(usage()));
    };
    let value = raw.parse::<f32>().map_err(|_| CliError::Usage(usage()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(CliError::Usage(usage()));
    }
    Ok(value)
}

fn next_string<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<String, CliError> {
    it.next().cloned().ok_or(CliError::Usage(usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();
    let mut command = None;

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" if command.is_none() => command = Some(Command::Layout),
            "render" if command.is_none() => command = Some(Command::Render),
            "convert" if command.is_none() => command = Some(Command::Convert),
            "validate" if command.is_none() => command = Some(Command::Validate),
            "--pretty" => args.pretty = true,
            "--fit" => args.fit = true,
            "--config" => args.config_path = Some(next_string(&mut it)?),
            "--node-width" => args.node_width = Some(next_f32(&mut it)?),
            "--node-height" => args.node_height = Some(next_f32(&mut it)?),
            "--h-spacing" => args.h_spacing = Some(next_f32(&mut it)?),
            "--v-spacing" => args.v_spacing = Some(next_f32(&mut it)?),
            "--padding" => args.padding = Some(next_f32(&mut it)?),
            "--width" => args.width = Some(next_f32(&mut it)?),
            "--height" => args.height = Some(next_f32(&mut it)?),
            "--out" => args.out = Some(next_string(&mut it)?),
            "--theme" => {
                args.theme =
                    Theme::by_name(&next_string(&mut it)?).ok_or(CliError::Usage(usage()))?;
            }
            "--to" => {
                args.to = next_string(&mut it)?
                    .parse::<Format>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    args.command = command.ok_or(CliError::Usage(usage()))?;
    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<Vec<u8>, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read(path)?),
    }
}

/// Decode a diagram from JSON, MessagePack, or outline text.
///
/// JSON is recognised by a leading `{`; bytes that are not UTF-8 are
/// taken as MessagePack; anything else is an outline.
fn decode_diagram(bytes: &[u8]) -> Result<Diagram, CliError> {
    let Ok(text) = std::str::from_utf8(bytes) else {
        log::debug!("input is not UTF-8, decoding as MessagePack");
        return Ok(snapshot::from_msgpack(bytes)?);
    };
    if text.trim_start().starts_with('{') {
        log::debug!("decoding JSON snapshot");
        return Ok(snapshot::from_json(text)?);
    }
    log::debug!("decoding outline");
    let map = parse_outline(text).map_err(CliError::Outline)?;
    Ok(Diagram::new(map, Default::default()))
}

fn layout_config(args: &Args) -> Result<LayoutConfig, CliError> {
    let mut config = match &args.config_path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => LayoutConfig::default(),
    };
    if let Some(v) = args.node_width {
        config.node_width = v;
    }
    if let Some(v) = args.node_height {
        config.node_height = v;
    }
    if let Some(v) = args.h_spacing {
        config.horizontal_spacing = v;
    }
    if let Some(v) = args.v_spacing {
        config.vertical_spacing = v;
    }
    if let Some(v) = args.padding {
        config.padding = v;
    }
    log::debug!("layout config: {config:?}");
    Ok(config)
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<Vec<u8>, CliError> {
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_output(bytes: &[u8], out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
        Some(path) => {
            std::fs::write(path, bytes)?;
            log::info!("wrote {} bytes to {path}", bytes.len());
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let bytes = read_input(args.input.as_deref())?;
    let diagram = decode_diagram(&bytes)?;
    log::debug!("loaded {} nodes", diagram.map.node_count());

    let output = match args.command {
        Command::Validate => {
            format!("ok: {} nodes\n", diagram.map.node_count()).into_bytes()
        }
        Command::Layout => {
            let config = layout_config(&args)?;
            let layout = resolve_layout(&diagram.map, config);
            let out = LayoutOut {
                snapshot: Snapshot::with_layout(&diagram, &layout),
                connectors: layout.connectors(),
                config,
            };
            write_json(&out, args.pretty)?
        }
        Command::Render => {
            let config = layout_config(&args)?;
            let layout = resolve_layout(&diagram.map, config);
            let size = match (args.width, args.height) {
                (None, None) => None,
                (w, h) => {
                    let view = diagram.view;
                    Some((w.unwrap_or(view.width), h.unwrap_or(view.height)))
                }
            };
            let options = SvgOptions {
                view: (!args.fit).then_some(diagram.view),
                selected: None,
                theme: args.theme,
                size,
            };
            render_svg(&diagram.map, &layout, &options).into_bytes()
        }
        Command::Convert => match args.to {
            Format::Json => write_json(&Snapshot::of(&diagram), args.pretty)?,
            Format::Outline => emit_outline(&diagram.map).into_bytes(),
            Format::Msgpack => snapshot::to_msgpack(&diagram)?,
        },
    };

    write_output(&output, args.out.as_deref())
}

fn main() {
    env_logger::init();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    log::debug!("{args:?}");

    if let Err(err) = run(args) {
        eprintln!("{err}");
        let code = match err {
            CliError::Snapshot(_) | CliError::Outline(_) => 3,
            _ => 1,
        };
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("mm-cli")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn command_is_required() {
        assert!(matches!(parse_args(&argv(&[])), Err(CliError::Usage(_))));
        assert!(matches!(
            parse_args(&argv(&["map.json"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn layout_flags_override_config() {
        let args = parse_args(&argv(&["layout", "--node-width", "200", "--v-spacing", "10", "map.json"]))
            .unwrap();
        assert_eq!(args.command, Command::Layout);
        assert_eq!(args.input.as_deref(), Some("map.json"));
        let config = layout_config(&args).unwrap();
        assert_eq!(config.node_width, 200.0);
        assert_eq!(config.vertical_spacing, 10.0);
        assert_eq!(config.node_height, 50.0);
    }

    #[test]
    fn rejects_bad_values() {
        for bad in [
            &["layout", "--padding", "-1"][..],
            &["layout", "--node-width", "wide"][..],
            &["render", "--theme", "sepia"][..],
            &["convert", "--to", "yaml"][..],
            &["layout", "--unknown"][..],
            &["layout", "a.json", "b.json"][..],
        ] {
            assert!(
                matches!(parse_args(&argv(bad)), Err(CliError::Usage(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn stdin_dash_is_input() {
        let args = parse_args(&argv(&["convert", "--to", "outline", "-"])).unwrap();
        assert_eq!(args.input.as_deref(), Some("-"));
        assert_eq!(args.to, Format::Outline);
    }

    #[test]
    fn detects_input_format() {
        let from_outline = decode_diagram(b"Economy\n  - GDP\n").unwrap();
        assert_eq!(from_outline.map.node_count(), 2);

        let packed = snapshot::to_msgpack(&from_outline).unwrap();
        assert_eq!(decode_diagram(&packed).unwrap(), from_outline);

        let json = snapshot::to_json(&from_outline).unwrap();
        assert_eq!(decode_diagram(json.as_bytes()).unwrap(), from_outline);

        assert!(matches!(
            decode_diagram(b"{\"root\": 3}"),
            Err(CliError::Snapshot(_))
        ));
        assert!(matches!(
            decode_diagram(b"Economy\nGDP\n"),
            Err(CliError::Outline(_))
        ));
    }
}
