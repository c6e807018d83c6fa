use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use runny_types::{Command, NewCommand};
use runny_util::write_atomically;
use tracing::{debug, info};

use crate::{
    editor::{DEFAULT_CATALOGUE, append_command, remove_command},
    error::CatalogueError,
    parser::parse_catalogue,
};

/// File-backed command catalogue.
///
/// Readers take an `Arc` snapshot and never observe a half-applied edit.
/// Mutations hold the writer lock across the file rewrite and the snapshot
/// rebuild, so two concurrent edits cannot interleave.
#[derive(Debug)]
pub struct CatalogueStore {
    path: PathBuf,
    manipulation_allowed: bool,
    snapshot: RwLock<Arc<Vec<Command>>>,
    writer: Mutex<()>,
}

impl CatalogueStore {
    /// Load the catalogue at `path`, writing the default catalogue first if
    /// the file does not exist.
    pub fn open(path: impl Into<PathBuf>, manipulation_allowed: bool) -> Result<Self, CatalogueError> {
        let path = path.into();
        ensure_catalogue_file(&path)?;
        let commands = load(&path)?;
        info!(path = %path.display(), commands = commands.len(), "loaded command catalogue");
        Ok(Self {
            path,
            manipulation_allowed,
            snapshot: RwLock::new(Arc::new(commands)),
            writer: Mutex::new(()),
        })
    }

    /// Whether add/remove are permitted.
    pub fn manipulation_allowed(&self) -> bool {
        self.manipulation_allowed
    }

    /// Last successfully rebuilt catalogue.
    pub fn snapshot(&self) -> Arc<Vec<Command>> {
        Arc::clone(&self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Exact lookup on `(name, command)`.
    pub fn find(&self, name: &str, command: &str) -> Option<Command> {
        self.snapshot().iter().find(|entry| entry.matches(name, command)).cloned()
    }

    /// Re-read the catalogue file and swap in the new snapshot.
    pub fn reload(&self) -> Result<Arc<Vec<Command>>, CatalogueError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.rebuild()
    }

    /// Append a command to the catalogue file. Names must be unique.
    pub fn add(&self, new: &NewCommand) -> Result<Command, CatalogueError> {
        self.ensure_manipulation_allowed()?;
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let text = read(&self.path)?;
        let updated = append_command(&text, new)?;
        let name = new.command_name.trim();
        let template = new.command.trim();
        if self.snapshot().iter().any(|entry| entry.name == name) {
            return Err(CatalogueError::DuplicateName(name.to_string()));
        }

        write(&self.path, &updated)?;
        let commands = self.rebuild()?;
        info!(command = %name, "added command to catalogue");
        commands
            .iter()
            .rev()
            .find(|entry| entry.matches(name, template))
            .cloned()
            .ok_or_else(|| CatalogueError::NotFound(name.to_string()))
    }

    /// Remove the command identified by `(name, command)` and its directives.
    pub fn remove(&self, name: &str, command: &str) -> Result<(), CatalogueError> {
        self.ensure_manipulation_allowed()?;
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let text = read(&self.path)?;
        let (updated, removed) = remove_command(&text, name, command);
        if !removed {
            return Err(CatalogueError::NotFound(name.to_string()));
        }

        write(&self.path, &updated)?;
        self.rebuild()?;
        info!(command = %name, "removed command from catalogue");
        Ok(())
    }

    fn ensure_manipulation_allowed(&self) -> Result<(), CatalogueError> {
        if self.manipulation_allowed {
            Ok(())
        } else {
            Err(CatalogueError::ManipulationDisabled)
        }
    }

    fn rebuild(&self) -> Result<Arc<Vec<Command>>, CatalogueError> {
        let commands = Arc::new(load(&self.path)?);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&commands);
        debug!(commands = commands.len(), "rebuilt catalogue snapshot");
        Ok(commands)
    }
}

fn ensure_catalogue_file(path: &Path) -> Result<(), CatalogueError> {
    match fs::metadata(path) {
        Ok(_) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "creating default command catalogue");
            write(path, DEFAULT_CATALOGUE)
        }
        Err(source) => Err(CatalogueError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn load(path: &Path) -> Result<Vec<Command>, CatalogueError> {
    Ok(parse_catalogue(&read(path)?))
}

fn read(path: &Path) -> Result<String, CatalogueError> {
    fs::read_to_string(path).map_err(|source| CatalogueError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, text: &str) -> Result<(), CatalogueError> {
    write_atomically(path, text.as_bytes()).map_err(|source| CatalogueError::Write {
        path: path.to_path_buf(),
        source,
    })
}
