use std::{
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use emu::{cartridge_header::CartridgeHeader, gba::Gba};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: gomu <cartridge.gba> [--bios] [--log-dir <dir>] [--trace-file]";

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    cartridge: PathBuf,
    using_bios: bool,
    log_dir: Option<PathBuf>,
    trace_file: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut cartridge = None;
    let mut parsed = Args::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bios" => parsed.using_bios = true,
            "--trace-file" => parsed.trace_file = true,
            "--log-dir" => {
                let dir = args.next().ok_or("--log-dir needs a directory")?;
                parsed.log_dir = Some(PathBuf::from(dir));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            path => {
                if cartridge.is_some() {
                    return Err(format!("unexpected argument {path}"));
                }
                cartridge = Some(PathBuf::from(path));
            }
        }
    }

    parsed.cartridge = cartridge.ok_or("no cartridge found :(")?;
    Ok(parsed)
}

fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "gomu.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn main() -> ExitCode {
    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::from(1);
        }
    };

    // Dropping the guard flushes the file writer.
    let _guard = init_tracing(args.log_dir.as_deref());

    #[cfg(feature = "logger")]
    logger::init_logger(if args.trace_file {
        logger::LogKind::File
    } else {
        logger::LogKind::Stdout
    });
    #[cfg(not(feature = "logger"))]
    if args.trace_file {
        warn!("--trace-file needs the `logger` feature, ignoring it");
    }

    info!("gomu v{}", env!("CARGO_PKG_VERSION"));

    let (cartridge_header, data) = match CartridgeHeader::from_file(&args.cartridge) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(2);
        }
    };

    cartridge_header.log_fields();
    if let Err(e) = cartridge_header.validate() {
        warn!("{} ({} bytes): {e}", args.cartridge.display(), data.len());
    }

    let mut gba = Gba::new(cartridge_header, args.using_bios);
    if let Err(e) = gba.boot() {
        error!("boot failed: {e}");
        return ExitCode::from(2);
    }

    info!("mode {}", gba.cpu.mode());
    for (n, value) in gba.cpu.visible_registers().iter().enumerate() {
        info!("R{n:<2} 0x{value:08X}");
    }
    info!("CPSR {}", gba.cpu.cpsr());

    logger::flush();

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(ToString::to_string).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn cartridge_only() {
        let parsed = parse_args(args(&["rom.gba"])).unwrap();
        assert_eq!(
            parsed,
            Args {
                cartridge: PathBuf::from("rom.gba"),
                ..Args::default()
            }
        );
    }

    #[test]
    fn all_options() {
        let parsed = parse_args(args(&[
            "--bios",
            "rom.gba",
            "--log-dir",
            "/tmp/gomu",
            "--trace-file",
        ]))
        .unwrap();

        assert_eq!(
            parsed,
            Args {
                cartridge: PathBuf::from("rom.gba"),
                using_bios: true,
                log_dir: Some(PathBuf::from("/tmp/gomu")),
                trace_file: true,
            }
        );
    }

    #[test]
    fn missing_cartridge() {
        assert!(parse_args(args(&["--bios"])).is_err());
        assert!(parse_args(args(&[])).is_err());
    }

    #[test]
    fn bad_arguments() {
        assert!(parse_args(args(&["rom.gba", "--log-dir"])).is_err());
        assert!(parse_args(args(&["rom.gba", "--fast"])).is_err());
        assert!(parse_args(args(&["a.gba", "b.gba"])).is_err());
    }
}
