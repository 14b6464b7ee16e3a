use super::markdown::{
    Document, FrontmatterFormat, detect_format, parse_document, render_document,
};
use super::store::{SprintStore, TaskStore, left_sprint, sort_sprints, sort_tasks};
use crate::{
    config::{IdMode, SprintsConfig},
    error::{Result, SprintError},
    model::{Sprint, SprintAssignment, SprintPatch, SprintStatus, Task},
    validation,
};
use slug::slugify;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

const SPRINTS_DIR: &str = "sprints";
const TASKS_DIR: &str = "tasks";
const LEASES_DIR: &str = ".leases";

struct Scanned<T> {
    path: PathBuf,
    content: Option<String>,
    doc: Result<T>,
}

/// Flat-file store: one markdown file per sprint or task.
///
/// ```text
/// .sprints/
///   sprints/sp-k2m9x--sprint-4.md
///   tasks/tk-00017--fix-login-redirect.md
/// ```
///
/// Nothing is cached; every call reads the files fresh.
pub struct FileStore {
    data_path: PathBuf,
    sprints_path: PathBuf,
    tasks_path: PathBuf,
    sprint_prefix: String,
    task_prefix: String,
    id_length: usize,
    id_mode: IdMode,
    frontmatter_format: FrontmatterFormat,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(config: &SprintsConfig, project_root: &Path) -> Self {
        let data_path = config.data_path(project_root);
        Self {
            sprints_path: data_path.join(SPRINTS_DIR),
            tasks_path: data_path.join(TASKS_DIR),
            data_path,
            sprint_prefix: config.sprints.sprint_prefix.clone(),
            task_prefix: config.sprints.task_prefix.clone(),
            id_length: config.sprints.id_length,
            id_mode: config.sprints.id_mode,
            frontmatter_format: config.sprints.frontmatter_format(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| SprintError::Storage("File store lock poisoned".to_string()))
    }

    fn generate_id(&self, prefix: &str, counter: &str) -> Result<String> {
        let suffix = match self.id_mode {
            IdMode::Random => self.generate_random_suffix(),
            IdMode::Sequential => self.generate_sequential_suffix(counter)?,
        };
        Ok(format!("{}{}", prefix, suffix))
    }

    fn generate_random_suffix(&self) -> String {
        const ALPHABET: [char; 36] = [
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g',
            'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x',
            'y', 'z',
        ];
        nanoid::format(nanoid::rngs::default, &ALPHABET, self.id_length)
    }

    fn generate_sequential_suffix(&self, counter: &str) -> Result<String> {
        let _guard = self.lock()?;
        let counter_path = self.data_path.join(counter);

        std::fs::create_dir_all(&self.data_path)?;

        let current = if counter_path.exists() {
            let content = std::fs::read_to_string(&counter_path)?;
            content.trim().parse::<u64>().unwrap_or(0)
        } else {
            0
        };
        let next = current + 1;
        atomic_write(&counter_path, &next.to_string())?;

        Ok(format!("{:0>width$}", next, width = self.id_length))
    }

    pub fn generate_filename(id: &str, title: &str) -> String {
        let slug: String = slugify(title).chars().take(50).collect();
        format!("{}--{}.md", id, slug)
    }

    fn find_file(dir: &Path, id: &str) -> Result<Option<PathBuf>> {
        if !dir.exists() {
            return Ok(None);
        }
        let marker = format!("{}--", id);
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(filename) = path.file_name() else {
                continue;
            };
            if filename.to_string_lossy().starts_with(&marker) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn read_doc<T: Document>(dir: &Path, id: &str) -> Result<Option<(T, PathBuf)>> {
        validation::validate_id(id)?;
        let Some(path) = Self::find_file(dir, id)? else {
            return Ok(None);
        };
        let content = std::fs::read_to_string(&path)?;
        Ok(Some((parse_document(&content)?, path)))
    }

    /// Reads every markdown document in `dir`, keeping the raw content so
    /// callers can decide what to do with files that fail to parse.
    fn scan_docs<T: Document>(dir: &Path) -> Result<Vec<Scanned<T>>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut scanned = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !(path.is_file() && path.extension().map(|e| e == "md").unwrap_or(false)) {
                continue;
            }
            let (content, doc) = match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let doc = parse_document(&content);
                    (Some(content), doc)
                }
                Err(e) => (None, Err(e.into())),
            };
            scanned.push(Scanned { path, content, doc });
        }
        Ok(scanned)
    }

    /// Lenient listing: unreadable documents are logged and skipped.
    fn list_docs<T: Document>(dir: &Path) -> Result<Vec<T>> {
        let mut docs = Vec::new();
        for item in Self::scan_docs::<T>(dir)? {
            match item.doc {
                Ok(doc) => docs.push(doc),
                Err(e) => tracing::warn!(
                    path = %item.path.display(),
                    error = %e,
                    "Failed to read document"
                ),
            }
        }
        Ok(docs)
    }

    fn lease_path(&self, id: &str) -> Result<PathBuf> {
        validation::validate_id(id)?;
        Ok(self.data_path.join(LEASES_DIR).join(format!("{}.lock", id)))
    }

    /// Writes `doc` under its canonical filename, removing `old_path` when the
    /// title change moved it. Existing files keep their frontmatter format.
    fn write_doc<T: Document>(
        &self,
        dir: &Path,
        id: &str,
        title: &str,
        doc: &T,
        old_path: Option<&Path>,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let new_path = dir.join(Self::generate_filename(id, title));

        let format = match old_path {
            Some(old) => {
                let original = std::fs::read_to_string(old)?;
                detect_format(&original).unwrap_or(self.frontmatter_format)
            }
            None => self.frontmatter_format,
        };
        let content = render_document(doc, format)?;
        atomic_write(&new_path, &content)?;

        if let Some(old) = old_path
            && old != new_path
        {
            std::fs::remove_file(old)?;
        }
        Ok(new_path)
    }

    pub fn sprint_path(&self, id: &str) -> Result<PathBuf> {
        Self::find_file(&self.sprints_path, id)?
            .ok_or_else(|| SprintError::NotFound(format!("Sprint {}", id)))
    }

    pub fn task_path(&self, id: &str) -> Result<PathBuf> {
        Self::find_file(&self.tasks_path, id)?
            .ok_or_else(|| SprintError::NotFound(format!("Task {}", id)))
    }
}

impl SprintStore for FileStore {
    fn find_sprint_by_id(&self, id: &str) -> Result<Option<Sprint>> {
        Ok(Self::read_doc::<Sprint>(&self.sprints_path, id)?.map(|(s, _)| s))
    }

    fn list_sprints(&self, project: Option<&str>) -> Result<Vec<Sprint>> {
        let mut sprints: Vec<Sprint> = Self::list_docs(&self.sprints_path)?;
        if let Some(project) = project {
            sprints.retain(|s| s.project == project);
        }
        sort_sprints(&mut sprints);
        Ok(sprints)
    }

    fn insert_sprint(&self, sprint: &Sprint) -> Result<Sprint> {
        tracing::info!(id = %sprint.id, name = %sprint.name, "Creating sprint");
        validation::validate_id(&sprint.id)?;
        validation::validate_sprint_name(&sprint.name)?;
        validation::validate_body(&sprint.goal)?;

        let _guard = self.lock()?;
        if Self::find_file(&self.sprints_path, &sprint.id)?.is_some() {
            return Err(SprintError::Storage(format!(
                "Sprint {} already exists",
                sprint.id
            )));
        }
        self.write_doc(&self.sprints_path, &sprint.id, &sprint.name, sprint, None)?;
        Ok(sprint.clone())
    }

    fn update_sprint_status(
        &self,
        id: &str,
        expected: SprintStatus,
        patch: &SprintPatch,
    ) -> Result<Sprint> {
        let _guard = self.lock()?;
        let (mut sprint, path) = Self::read_doc::<Sprint>(&self.sprints_path, id)?
            .ok_or_else(|| SprintError::NotFound(format!("Sprint {}", id)))?;

        if sprint.status != expected {
            return Err(SprintError::Conflict(format!(
                "Sprint {} is {} (expected {})",
                id, sprint.status, expected
            )));
        }

        tracing::info!(id = %id, from = %sprint.status, to = %patch.status, "Updating sprint status");
        patch.apply(&mut sprint);
        self.write_doc(&self.sprints_path, id, &sprint.name, &sprint, Some(&path))?;
        Ok(sprint)
    }

    fn next_sprint_id(&self) -> Result<String> {
        self.generate_id(&self.sprint_prefix, ".sprint-id")
    }

    /// The lease is a lock file created with `create_new`, so it also excludes
    /// other processes. A crash while completing leaves the file behind; the
    /// conflict message names it so it can be removed by hand.
    fn acquire_completion_lease(&self, id: &str) -> Result<()> {
        let path = self.lease_path(id)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(SprintError::Conflict(format!(
                    "Sprint {} is already being completed (lease {} exists)",
                    id,
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        use std::io::Write;
        writeln!(file, "pid = {}", std::process::id())?;
        writeln!(file, "acquired = \"{}\"", chrono::Utc::now().to_rfc3339())?;
        tracing::debug!(sprint = %id, lease = %path.display(), "Acquired completion lease");
        Ok(())
    }

    fn release_completion_lease(&self, id: &str) -> Result<()> {
        let path = self.lease_path(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl TaskStore for FileStore {
    fn find_task_by_id(&self, id: &str) -> Result<Option<Task>> {
        Ok(Self::read_doc::<Task>(&self.tasks_path, id)?.map(|(t, _)| t))
    }

    fn find_tasks_by_sprint(&self, sprint_id: &str) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for item in Self::scan_docs::<Task>(&self.tasks_path)? {
            match item.doc {
                Ok(task) if task.sprint.as_deref() == Some(sprint_id) => tasks.push(task),
                Ok(_) => {}
                // A file that never mentions the sprint cannot be assigned to it.
                Err(e) if item.content.as_deref().is_some_and(|c| !c.contains(sprint_id)) => {
                    tracing::warn!(
                        path = %item.path.display(),
                        error = %e,
                        "Skipping unreadable task file"
                    );
                }
                Err(e) => {
                    return Err(SprintError::Storage(format!(
                        "Task file {} may belong to sprint {} but cannot be read: {}",
                        item.path.display(),
                        sprint_id,
                        e
                    )));
                }
            }
        }
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    fn update_task_sprint_assignment(
        &self,
        id: &str,
        assignment: &SprintAssignment,
    ) -> Result<Task> {
        let _guard = self.lock()?;
        let (mut task, path) = Self::read_doc::<Task>(&self.tasks_path, id)?
            .ok_or_else(|| SprintError::NotFound(format!("Task {}", id)))?;

        if !assignment.applies_to(&task) {
            return Err(left_sprint(id, assignment));
        }
        if assignment.apply(&mut task) {
            tracing::debug!(
                id = %id,
                sprint = ?task.sprint,
                backlog = task.moved_to_backlog,
                "Writing task sprint assignment"
            );
            self.write_doc(&self.tasks_path, id, &task.title, &task, Some(&path))?;
        }
        Ok(task)
    }

    fn insert_task(&self, task: &Task) -> Result<Task> {
        tracing::info!(id = %task.id, title = %task.title, "Creating task");
        validation::validate_id(&task.id)?;
        validation::validate_title(&task.title)?;
        validation::validate_body(&task.description)?;

        let _guard = self.lock()?;
        if Self::find_file(&self.tasks_path, &task.id)?.is_some() {
            return Err(SprintError::Storage(format!(
                "Task {} already exists",
                task.id
            )));
        }
        self.write_doc(&self.tasks_path, &task.id, &task.title, task, None)?;
        Ok(task.clone())
    }

    fn save_task(&self, task: &Task) -> Result<Task> {
        tracing::info!(id = %task.id, title = %task.title, "Updating task");
        validation::validate_title(&task.title)?;
        validation::validate_body(&task.description)?;

        let _guard = self.lock()?;
        let path = self.task_path(&task.id)?;
        let mut task = task.clone();
        task.touch();
        self.write_doc(&self.tasks_path, &task.id, &task.title, &task, Some(&path))?;
        Ok(task)
    }

    fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = Self::list_docs(&self.tasks_path)?;
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    fn next_task_id(&self) -> Result<String> {
        self.generate_id(&self.task_prefix, ".task-id")
    }
}

/// Atomically write content to a file using temp file + rename
fn atomic_write(target_path: &Path, content: &str) -> Result<()> {
    let target_dir = target_path
        .parent()
        .ok_or_else(|| SprintError::Storage("Target path has no parent directory".to_string()))?;

    let mut temp_file = NamedTempFile::new_in(target_dir)
        .map_err(|e| SprintError::Storage(format!("Failed to create temp file: {}", e)))?;

    use std::io::Write;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| SprintError::Storage(format!("Failed to write to temp file: {}", e)))?;

    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| SprintError::Storage(format!("Failed to sync temp file: {}", e)))?;

    temp_file
        .persist(target_path)
        .map_err(|e| SprintError::Storage(format!("Failed to persist temp file: {}", e)))?;

    Ok(())
}
