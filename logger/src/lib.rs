//! Instruction trace sink.
//!
//! Every executed instruction is written with the time elapsed since
//! [`init_logger`]. Without the `logger` feature [`log`] and [`flush`]
//! compile to nothing.

#[cfg(feature = "logger")]
use chrono::Utc;
#[cfg(feature = "logger")]
use once_cell::sync::OnceCell;
#[cfg(feature = "logger")]
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
    sync::Mutex,
    time::Instant,
};

#[cfg(feature = "logger")]
static TRACER: OnceCell<Tracer> = OnceCell::new();

#[cfg(feature = "logger")]
type Writer = Box<dyn Write + Send>;

#[cfg(feature = "logger")]
struct Sink {
    writer: Writer,
    path: Option<PathBuf>,
    start_instant: Instant,
}

#[cfg(feature = "logger")]
impl Sink {
    fn new(kind: LogKind) -> Self {
        let start_instant = Instant::now();
        let (writer, path): (Writer, _) = match kind {
            LogKind::Stdout => (Box::new(io::stdout()) as Writer, None),
            LogKind::File => {
                let path = trace_file_path();
                match File::create(&path) {
                    Ok(file) => {
                        println!("Tracing instructions to {}", path.display());
                        (Box::new(BufWriter::new(file)) as Writer, Some(path))
                    }
                    Err(e) => {
                        eprintln!("cannot create {}: {e}, tracing to stdout", path.display());
                        (Box::new(io::stdout()) as Writer, None)
                    }
                }
            }
        };

        Self {
            writer,
            path,
            start_instant,
        }
    }

    fn log<T>(&mut self, data: T)
    where
        T: std::fmt::Display,
    {
        let now = self.start_instant.elapsed();
        let seconds = now.as_secs();
        let hours = seconds / 3600;
        let minutes = (seconds / 60) % 60;
        let seconds = seconds % 60;
        let milliseconds = now.subsec_millis();

        // A full disk must not stop the emulation.
        writeln!(
            self.writer,
            "[{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}] {data}"
        )
        .ok();
    }

    fn flush(&mut self) {
        self.writer.flush().ok();
    }
}

#[cfg(feature = "logger")]
fn trace_file_path() -> PathBuf {
    let filename = format!("gomu-trace-{}.log", Utc::now().timestamp());
    std::env::temp_dir().join(filename)
}

/// Where the instruction trace goes.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LogKind {
    /// Console, the default choice.
    #[default]
    Stdout,

    /// `<temp dir>/gomu-trace-<timestamp>.log`
    File,
}

#[cfg(feature = "logger")]
struct Tracer {
    sink: Mutex<Sink>,
}

#[cfg(feature = "logger")]
impl Tracer {
    fn new(kind: LogKind) -> Self {
        Self {
            sink: Mutex::new(Sink::new(kind)),
        }
    }

    fn log<T>(&self, data: T)
    where
        T: std::fmt::Display,
    {
        if let Ok(ref mut sink) = self.sink.lock() {
            sink.log(data);
        }
    }

    fn flush(&self) {
        if let Ok(ref mut sink) = self.sink.lock() {
            sink.flush();
        }
    }

    fn path(&self) -> Option<PathBuf> {
        self.sink.lock().ok().and_then(|sink| sink.path.clone())
    }
}

/// Installs the global sink. Only the first call has an effect.
#[cfg(feature = "logger")]
pub fn init_logger(kind: LogKind) {
    TRACER.set(Tracer::new(kind)).ok();
}

/// The file the trace is written to, `None` when tracing to stdout or
/// before [`init_logger`].
#[cfg(feature = "logger")]
pub fn trace_file() -> Option<PathBuf> {
    TRACER.get().and_then(Tracer::path)
}

pub fn log<T>(data: T)
where
    T: std::fmt::Display,
{
    let _ = data;
    #[cfg(feature = "logger")]
    if let Some(tracer) = TRACER.get() {
        tracer.log(data);
    }
}

/// Writes out whatever the file sink is still buffering.
pub fn flush() {
    #[cfg(feature = "logger")]
    if let Some(tracer) = TRACER.get() {
        tracer.flush();
    }
}
