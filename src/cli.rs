//! Headless front-end: opens one session, replays operations through the
//! same tool paths a pointer would take, and writes the exported image.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use crate::config::{load_editor_config, load_editor_config_from, EditorConfig};
use crate::editor::{EditorSession, ImageCaption, SavedImage, ToolKind};
use crate::error::{AppError, AppResult};
use crate::geometry::{Point, Rect};
use crate::render::{ExportFormat, RasterRenderer};
use crate::source::{FileFetcher, ImageSource};
use crate::storage::FileMediaStorage;

#[derive(Parser, Debug)]
#[command(
    name = "retouch",
    about = "Crop, resize, rotate and blur an image without a GUI",
    long_about = "Applies editing operations in order, in display coordinates of an\n\
                  editor sized to --container-width, then writes the result.\n\n\
                  Example:\n  \
                  retouch -i photo.png -o out.png --op rotate --op crop:20,20,200,120"
)]
pub struct CliArgs {
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output file. The extension picks the format; anything but jpg/jpeg is PNG.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Width of the editor the operations were measured in.
    #[arg(long, default_value_t = 0.0, value_name = "PX")]
    pub container_width: f64,

    /// rotate | crop:X,Y,W,H | resize:W,H | blur:X,Y | undo
    #[arg(long = "op", value_name = "OP")]
    pub ops: Vec<Operation>,

    /// Config file to use instead of the per-user one.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also hand the result to the media store.
    #[arg(long)]
    pub store: bool,

    #[arg(long, requires = "store")]
    pub caption: Option<String>,

    #[arg(long, requires = "store")]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Rotate,
    Crop(Rect),
    Resize { width: f64, height: f64 },
    Blur(Point),
    Undo,
}

impl FromStr for Operation {
    type Err = AppError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| AppError::InvalidOperation {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let (name, args) = match input.split_once(':') {
            Some((name, args)) => (name, Some(args)),
            None => (input, None),
        };
        let numbers = match args {
            Some(args) => args
                .split(',')
                .map(|value| value.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| invalid("arguments must be numbers"))?,
            None => Vec::new(),
        };

        match (name.trim().to_ascii_lowercase().as_str(), numbers.as_slice()) {
            ("rotate", []) => Ok(Self::Rotate),
            ("undo", []) => Ok(Self::Undo),
            ("crop", &[x, y, width, height]) => {
                if width <= 0.0 || height <= 0.0 {
                    return Err(invalid("crop needs a positive width and height"));
                }
                Ok(Self::Crop(Rect::new(x, y, width, height)))
            }
            ("resize", &[width, height]) => {
                if width <= 0.0 || height <= 0.0 {
                    return Err(invalid("resize needs a positive width and height"));
                }
                Ok(Self::Resize { width, height })
            }
            ("blur", &[x, y]) => Ok(Self::Blur(Point::new(x, y))),
            ("rotate" | "undo" | "crop" | "resize" | "blur", _) => {
                Err(invalid("wrong number of arguments"))
            }
            _ => Err(invalid("unknown operation")),
        }
    }
}

impl Operation {
    fn label(&self) -> &'static str {
        match self {
            Self::Rotate => "rotate",
            Self::Crop(_) => "crop",
            Self::Resize { .. } => "resize",
            Self::Blur(_) => "blur",
            Self::Undo => "undo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutcome {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub saved: Option<SavedImage>,
}

pub fn run(args: &CliArgs) -> AppResult<CliOutcome> {
    let config = match &args.config {
        Some(path) => load_editor_config_from(path),
        None => load_editor_config(),
    };
    let source = ImageSource::Url(args.input.display().to_string());
    let mut session =
        EditorSession::open(&source, &FileFetcher::new(), args.container_width, config)?;

    for operation in &args.ops {
        tracing::debug!(operation = operation.label(), "applying operation");
        apply(&mut session, operation)?;
    }

    let renderer = RasterRenderer::new(output_format(args, session.config()));
    let encoded = session.export(&renderer).map_err(crate::EditorError::from)?;
    std::fs::write(&args.output, &encoded.bytes).map_err(|source| AppError::Write {
        path: args.output.clone(),
        source,
    })?;
    tracing::info!(path = %args.output.display(), "edited image written");

    let saved = if args.store {
        Some(store(&session, &renderer, args)?)
    } else {
        None
    };

    Ok(CliOutcome {
        output: args.output.clone(),
        width: encoded.width,
        height: encoded.height,
        saved,
    })
}

fn store(
    session: &EditorSession,
    renderer: &RasterRenderer,
    args: &CliArgs,
) -> AppResult<SavedImage> {
    let storage = match &session.config().media_dir {
        Some(dir) => FileMediaStorage::with_paths(dir.clone()),
        None => FileMediaStorage::with_default_paths()?,
    };
    let caption = ImageCaption {
        caption: args.caption.clone(),
        alt_text: args.alt_text.clone(),
    };
    let mut failure = None;
    let saved = session.save(renderer, &storage, caption, |err| failure = Some(err));
    match (saved, failure) {
        (Some(saved), _) => Ok(saved),
        (None, Some(err)) => Err(err.into()),
        (None, None) => Err(AppError::NoEffect {
            operation: "store".to_string(),
        }),
    }
}

fn output_format(args: &CliArgs, config: &EditorConfig) -> ExportFormat {
    match args.output.extension().and_then(OsStr::to_str) {
        Some(extension) => match ExportFormat::from_extension(extension) {
            ExportFormat::Jpeg { .. } => ExportFormat::Jpeg {
                quality: config.jpeg_quality.clamp(1, 100),
            },
            ExportFormat::Png => ExportFormat::Png,
        },
        None => config.export_format(),
    }
}

fn apply(session: &mut EditorSession, operation: &Operation) -> AppResult<()> {
    match *operation {
        Operation::Rotate => {
            session.rotate()?;
        }
        Operation::Undo => {
            if !session.undo()? {
                tracing::warn!("nothing to undo");
            }
        }
        Operation::Crop(target) => {
            session.switch_tool(ToolKind::Crop)?;
            let display = session.surface().display_size();
            let mask = current_mask(session, operation)?;
            drag(
                session,
                Point::new(mask.right(), mask.bottom()),
                Point::new(display.width, display.height),
                operation,
            )?;
            drag(
                session,
                Point::new(mask.x, mask.y),
                Point::new(target.x, target.y),
                operation,
            )?;
            let mask = current_mask(session, operation)?;
            drag(
                session,
                Point::new(mask.right(), mask.bottom()),
                Point::new(target.right(), target.bottom()),
                operation,
            )?;
            commit(session, operation)?;
        }
        Operation::Resize { width, height } => {
            session.switch_tool(ToolKind::Resize)?;
            let keep_aspect_ratio = session.config().keep_aspect_ratio;
            session.set_keep_aspect_ratio(false);
            let display = session.surface().display_size();
            let result = drag(
                session,
                Point::new(display.width, display.height),
                Point::new(width, height),
                operation,
            )
            .and_then(|()| commit(session, operation));
            session.set_keep_aspect_ratio(keep_aspect_ratio);
            result?;
        }
        Operation::Blur(point) => {
            session.switch_tool(ToolKind::Blur)?;
            session.pointer_down(point)?;
            session.pointer_up(point);
            session.cancel_tool()?;
        }
    }
    Ok(())
}

fn current_mask(session: &EditorSession, operation: &Operation) -> AppResult<Rect> {
    session.crop_tool().mask().ok_or_else(|| AppError::NoEffect {
        operation: operation.label().to_string(),
    })
}

fn drag(
    session: &mut EditorSession,
    from: Point,
    to: Point,
    operation: &Operation,
) -> AppResult<()> {
    if !session.pointer_down(from)? {
        return Err(AppError::NoEffect {
            operation: operation.label().to_string(),
        });
    }
    session.pointer_move(to)?;
    session.pointer_up(to);
    Ok(())
}

fn commit(session: &mut EditorSession, operation: &Operation) -> AppResult<()> {
    if !session.commit_tool()? {
        tracing::warn!(operation = operation.label(), "operation left the image unchanged");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn args(dir: &std::path::Path, ops: &[&str]) -> CliArgs {
        let input = dir.join("in.png");
        RgbaImage::from_pixel(800, 600, Rgba([40, 80, 120, 255]))
            .save(&input)
            .expect("fixture should be written");
        let config = dir.join("config.json");
        std::fs::write(&config, r#"{ "media_dir": null }"#).expect("config should be written");
        CliArgs {
            input,
            output: dir.join("out.png"),
            container_width: 400.0,
            ops: ops
                .iter()
                .map(|op| op.parse().expect("operation should parse"))
                .collect(),
            config: Some(config),
            store: false,
            caption: None,
            alt_text: None,
        }
    }

    #[test]
    fn operations_parse_with_arguments() {
        assert_eq!("rotate".parse::<Operation>().ok(), Some(Operation::Rotate));
        assert_eq!(
            "crop:10,20,30,40".parse::<Operation>().ok(),
            Some(Operation::Crop(Rect::new(10.0, 20.0, 30.0, 40.0)))
        );
        assert_eq!(
            "resize: 300, 150".parse::<Operation>().ok(),
            Some(Operation::Resize {
                width: 300.0,
                height: 150.0
            })
        );
        assert!(matches!(
            "crop:1,2".parse::<Operation>(),
            Err(AppError::InvalidOperation { .. })
        ));
        assert!(matches!(
            "sharpen".parse::<Operation>(),
            Err(AppError::InvalidOperation { .. })
        ));
        assert!(matches!(
            "blur:a,b".parse::<Operation>(),
            Err(AppError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn crop_then_rotate_writes_display_sized_output() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let args = args(dir.path(), &["crop:50,50,100,80", "rotate"]);

        let outcome = run(&args).expect("cli run should succeed");
        assert_eq!((outcome.width, outcome.height), (80, 100));
        let written = image::open(&outcome.output).expect("output should decode");
        assert_eq!((written.width(), written.height()), (80, 100));
        assert!(outcome.saved.is_none());
    }

    #[test]
    fn resize_and_undo_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let args = args(dir.path(), &["resize:300,100", "blur:20,20", "undo", "undo"]);

        let outcome = run(&args).expect("cli run should succeed");
        assert_eq!((outcome.width, outcome.height), (400, 300));
    }

    #[test]
    fn store_writes_into_configured_media_dir() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut args = args(dir.path(), &["resize:200,100"]);
        let media = dir.path().join("media");
        std::fs::write(
            args.config.as_ref().expect("config path should be set"),
            format!(r#"{{ "media_dir": {:?} }}"#, media.display().to_string()),
        )
        .expect("config should be written");
        args.store = true;
        args.caption = Some("dock".to_string());

        let outcome = run(&args).expect("cli run should succeed");
        let saved = outcome.saved.expect("store should return a saved image");
        assert!(saved.locator.starts_with("file://"));
        assert!(saved.display_url.contains("?t="));
        assert_eq!((saved.width, saved.height), (200, 100));
        assert_eq!(
            std::fs::read_dir(&media)
                .expect("media dir should exist")
                .count(),
            2
        );
    }
}
