//! object commands - Put, get and delete objects
//!
//! `put` reads the body from a file or stdin, `get` writes it to a file or
//! stdout. Both run against the backend chosen by `--local`.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use r2_core::{
    Error, ObjectMetadata, ObjectPath, Result, check_upload_size, parse_object_path, upload,
};
use serde::Serialize;

use super::{BackendArgs, Context};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, Spinner};

#[derive(Subcommand, Debug)]
pub enum ObjectCommands {
    /// Fetch an object from a bucket
    Get(GetArgs),

    /// Create an object in a bucket
    Put(PutArgs),

    /// Delete an object from a bucket
    Delete(DeleteArgs),
}

/// Fetch an object
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Object path (bucket/key)
    pub path: String,

    /// File to write the object body to
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Write the object body to stdout
    #[arg(short, long)]
    pub pipe: bool,

    #[command(flatten)]
    pub backend: BackendArgs,
}

/// Create an object
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Object path (bucket/key)
    pub path: String,

    /// File to upload
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Read the object body from stdin
    #[arg(short, long)]
    pub pipe: bool,

    #[command(flatten)]
    pub metadata: MetadataArgs,

    #[command(flatten)]
    pub backend: BackendArgs,
}

/// Delete an object
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Object path (bucket/key)
    pub path: String,

    #[command(flatten)]
    pub backend: BackendArgs,
}

/// HTTP metadata flags for `object put`
#[derive(Args, Debug, Clone, Default)]
pub struct MetadataArgs {
    /// Content type (guessed from the file extension when omitted)
    #[arg(long = "content-type", visible_alias = "ct", value_name = "TYPE")]
    pub content_type: Option<String>,

    /// Content disposition
    #[arg(long = "content-disposition", visible_alias = "cd", value_name = "VALUE")]
    pub content_disposition: Option<String>,

    /// Content encoding
    #[arg(long = "content-encoding", visible_alias = "ce", value_name = "VALUE")]
    pub content_encoding: Option<String>,

    /// Content language
    #[arg(long = "content-language", visible_alias = "cl", value_name = "VALUE")]
    pub content_language: Option<String>,

    /// Cache control
    #[arg(long = "cache-control", visible_alias = "cc", value_name = "VALUE")]
    pub cache_control: Option<String>,

    /// Expiration time
    #[arg(long = "expires", visible_alias = "e", value_name = "TIME")]
    pub expires: Option<String>,
}

impl MetadataArgs {
    /// Collect the flags into one metadata record
    pub fn to_metadata(&self) -> ObjectMetadata {
        ObjectMetadata {
            content_type: self.content_type.clone(),
            content_encoding: self.content_encoding.clone(),
            content_language: self.content_language.clone(),
            content_disposition: self.content_disposition.clone(),
            cache_control: self.cache_control.clone(),
            expires: self.expires.clone(),
        }
    }
}

/// Where an object body comes from or goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stream {
    File(PathBuf),
    Pipe,
}

/// Resolve `--file` / `--pipe`, which are mutually exclusive
pub fn stream_from_flags(file: Option<PathBuf>, pipe: bool) -> Result<Option<Stream>> {
    match (file, pipe) {
        (Some(_), true) => Err(Error::ArgumentConflict(
            "Arguments pipe and file are mutually exclusive".into(),
        )),
        (Some(file), false) => Ok(Some(Stream::File(file))),
        (None, true) => Ok(Some(Stream::Pipe)),
        (None, false) => Ok(None),
    }
}

#[derive(Debug, Serialize)]
struct ObjectOutput {
    status: &'static str,
    bucket: String,
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ObjectMetadata>,
}

impl ObjectOutput {
    fn new(path: &ObjectPath) -> Self {
        Self {
            status: "success",
            bucket: path.bucket.clone(),
            key: path.key.clone(),
            size_bytes: None,
            size_human: None,
            file: None,
            metadata: None,
        }
    }
}

/// Execute an object subcommand
pub async fn execute(cmd: ObjectCommands, ctx: &Context) -> ExitCode {
    let result = match cmd {
        ObjectCommands::Get(args) => get(args, ctx).await,
        ObjectCommands::Put(args) => put(args, ctx).await,
        ObjectCommands::Delete(args) => delete(args, ctx).await,
    };

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            Formatter::new(ctx.output.clone()).error(&e.to_string());
            ExitCode::from(&e)
        }
    }
}

async fn put(args: PutArgs, ctx: &Context) -> Result<()> {
    let formatter = Formatter::new(ctx.output.clone());

    let stream = stream_from_flags(args.file, args.pipe)?.ok_or_else(|| {
        Error::Validation("Either the --file or --pipe option must be used".into())
    })?;
    let path = parse_object_path(&args.path)?;
    let mut metadata = args.metadata.to_metadata();

    // The body is read and size-checked before any store is opened
    let body = match &stream {
        Stream::File(file) => {
            let name = file_display_name(file);
            check_upload_size(&name, std::fs::metadata(file)?.len())?;
            if metadata.content_type.is_none() {
                metadata.content_type = mime_guess::from_path(file)
                    .first()
                    .map(|mime| mime.essence_str().to_string());
            }
            std::fs::read(file)?
        }
        Stream::Pipe => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            check_upload_size(path.file_name(), buffer.len() as u64)?;
            buffer
        }
    };

    let store = ctx.open_store(&args.backend, &formatter)?;

    formatter.status(&format!(
        "Creating object \"{}\" in bucket \"{}\".",
        path.key, path.bucket
    ));

    let spinner = Spinner::start(&ctx.output, "Uploading");
    let info = upload(store.as_ref(), &path, body, &metadata).await?;
    spinner.finish_and_clear();

    if formatter.is_json() {
        let mut output = ObjectOutput::new(&path);
        output.size_bytes = Some(info.size_bytes);
        output.size_human = Some(info.size_human);
        output.metadata = (!metadata.is_empty()).then_some(metadata);
        formatter.json(&output);
    } else {
        formatter.success("Upload complete.");
    }
    Ok(())
}

async fn get(args: GetArgs, ctx: &Context) -> Result<()> {
    let stream = stream_from_flags(args.file, args.pipe)?.unwrap_or(Stream::Pipe);
    let path = parse_object_path(&args.path)?;

    // Status lines would corrupt a body written to stdout
    let output_config = if stream == Stream::Pipe {
        OutputConfig {
            quiet: true,
            ..ctx.output.clone()
        }
    } else {
        ctx.output.clone()
    };
    let formatter = Formatter::new(output_config.clone());

    let store = ctx.open_store(&args.backend, &formatter)?;

    formatter.status(&format!(
        "Downloading \"{}\" from \"{}\".",
        path.key, path.bucket
    ));

    let spinner = Spinner::start(&output_config, "Downloading");
    let object = store.get_object(&path).await?;
    spinner.finish_and_clear();

    match &stream {
        Stream::File(file) => {
            if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(file, &object.body)?;
        }
        Stream::Pipe => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&object.body)?;
            stdout.flush()?;
        }
    }

    if formatter.is_json() {
        let mut output = ObjectOutput::new(&path);
        output.size_bytes = Some(object.info.size_bytes);
        output.size_human = Some(object.info.size_human.clone());
        if let Stream::File(file) = &stream {
            output.file = Some(file.display().to_string());
        }
        output.metadata = (!object.metadata.is_empty()).then(|| object.metadata.clone());
        formatter.json(&output);
    } else {
        formatter.success("Download complete.");
    }
    Ok(())
}

async fn delete(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let formatter = Formatter::new(ctx.output.clone());
    let path = parse_object_path(&args.path)?;
    let store = ctx.open_store(&args.backend, &formatter)?;

    formatter.status(&format!(
        "Deleting object \"{}\" from bucket \"{}\".",
        path.key, path.bucket
    ));

    store.delete_object(&path).await?;

    if formatter.is_json() {
        formatter.json(&ObjectOutput::new(&path));
    } else {
        formatter.success("Delete complete.");
    }
    Ok(())
}

fn file_display_name(file: &Path) -> String {
    file.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}
