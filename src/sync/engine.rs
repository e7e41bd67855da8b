//! Synchronization engine: keeps the index a mirror of the note files.

use super::broken::{BrokenLink, note_broken_links, resolve_existing, scan_broken_links};
use super::error::{SyncError, SyncResult};
use super::report::{FileError, FileResult, ProgressReporter, SyncReport, Unresolved};
use crate::domain::{
    IdGenerator, LinkEdge, Note, NoteDraft, NoteError, NoteId, NoteKey, NoteKind,
};
use crate::index::ZettelRepository;
use crate::infra::{Vault, parse_filename, render_note_body};
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

/// Reconciles the note files of a [`Vault`] with a [`ZettelRepository`].
///
/// The filesystem is the source of truth. Every operation that changes a
/// file also updates the index; when the two drift apart anyway, `sync()`
/// re-derives the index from disk.
pub struct SyncEngine<R> {
    repo: R,
    vault: Vault,
    ids: IdGenerator,
}

impl<R: ZettelRepository> SyncEngine<R> {
    pub fn new(repo: R, vault: Vault) -> Self {
        Self {
            repo,
            vault,
            ids: IdGenerator::new(),
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    // ===========================================
    // Full Sync
    // ===========================================

    /// Rebuilds the index from both note areas.
    ///
    /// Files that cannot be read are skipped and recorded in the report.
    /// Running it twice without file changes leaves the index untouched.
    pub fn sync(&mut self, reporter: &mut dyn ProgressReporter) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();
        let paths = self.vault.list_all()?;
        report.scanned = paths.len();
        info!("event=sync_started files={}", paths.len());

        // Ids already on disk must never be handed out again.
        for path in &paths {
            if let Some(id) = parse_filename(path) {
                self.ids.reserve(&id);
            }
        }

        let mut seen = HashSet::new();
        let mut drafts = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.load_for_sync(path, &mut seen, &mut report) {
                Ok(note) => {
                    let result = if note.path() == path.as_path() {
                        FileResult::Indexed
                    } else {
                        FileResult::Renamed(note.path().to_path_buf())
                    };
                    reporter.on_file(path, result);
                    drafts.push(NoteDraft::from(&note));
                }
                Err(e) => {
                    warn!("event=sync_skipped path={} error={}", path.display(), e);
                    reporter.on_file(path, FileResult::Error(e.to_string()));
                    report.errors.push(FileError::new(path, e.to_string()));
                }
            }
        }

        let notes = self.repo.save_bulk(drafts)?;
        report.saved = notes.len();

        let synced: HashSet<NoteId> = notes.iter().map(|n| n.id().clone()).collect();
        let mut wanted = BTreeSet::new();
        for note in &notes {
            for target in self.resolve_targets(note, &mut report.unresolved)? {
                wanted.insert(LinkEdge::new(note.id().clone(), target));
            }
        }

        // Edges of notes that failed to load are left alone.
        let existing: BTreeSet<LinkEdge> = self
            .repo
            .edges()?
            .into_iter()
            .filter(|edge| synced.contains(&edge.from))
            .collect();
        let added: Vec<LinkEdge> = wanted.difference(&existing).cloned().collect();
        let stale: Vec<LinkEdge> = existing.difference(&wanted).cloned().collect();
        self.repo.link_bulk(&added)?;
        self.repo.unlink_bulk(&stale)?;
        report.linked = added.len();
        report.unlinked = stale.len();

        let missing: Vec<NoteId> = self
            .repo
            .list_all()?
            .into_iter()
            .filter(|note| !self.vault.exists(note.path()))
            .map(|note| note.id().clone())
            .collect();
        report.removed = self.repo.remove_bulk(&missing)?;

        info!(
            "event=sync_finished scanned={} created={} renamed={} saved={} linked={} unlinked={} removed={} errors={} unresolved={}",
            report.scanned,
            report.created,
            report.renamed,
            report.saved,
            report.linked,
            report.unlinked,
            report.removed,
            report.errors.len(),
            report.unresolved.len()
        );
        reporter.on_complete(&report);
        Ok(report)
    }

    fn load_for_sync(
        &mut self,
        path: &Path,
        seen: &mut HashSet<NoteId>,
        report: &mut SyncReport,
    ) -> SyncResult<Note> {
        let kind = self.vault.validate(path)?;
        let content = self.vault.read(path)?;

        let id = match parse_filename(path) {
            Some(id) if seen.insert(id.clone()) => id,
            other => {
                if let Some(duplicate) = other {
                    warn!(
                        "event=duplicate_id id={} path={}",
                        duplicate,
                        path.display()
                    );
                }
                let id = self.fresh_id()?;
                seen.insert(id.clone());
                report.created += 1;
                id
            }
        };

        let mut note = Note::from_content(id, content, path.to_path_buf(), kind)?;
        if self.rename_to_expected(&mut note)?.is_some() {
            report.renamed += 1;
        }
        Ok(note)
    }

    // ===========================================
    // Single Note Save and Repair
    // ===========================================

    /// Reads one note from disk and brings its index row, history entry and
    /// outbound edges up to date.
    ///
    /// A note without an id in its filename gets one, and the file is renamed
    /// to match its current title before anything is stored.
    pub fn save(&mut self, path: &Path) -> SyncResult<Note> {
        let path = self.vault.normalize(path);
        let mut note = self.read(&path)?;
        self.repair(&mut note)?;
        self.repo.insert_history(note.id())?;
        self.link_note(&mut note)?;
        debug!("event=note_synced id={} path={}", note.id(), note.path().display());
        Ok(note)
    }

    /// Reads a note file, assigning a fresh id when the filename has none or
    /// its id already belongs to another existing file.
    pub fn read(&mut self, path: &Path) -> SyncResult<Note> {
        let kind = self.vault.validate(path)?;
        let content = self.vault.read(path)?;

        let id = match parse_filename(path) {
            Some(id) => {
                self.ids.reserve(&id);
                match self.repo.get(&NoteKey::Id(id.clone())) {
                    Ok(owner) if owner.path() != path && self.vault.exists(owner.path()) => {
                        warn!(
                            "event=duplicate_id id={} path={} owner={}",
                            id,
                            path.display(),
                            owner.path().display()
                        );
                        self.fresh_id()?
                    }
                    Ok(_) => id,
                    Err(e) if e.is_not_found() => id,
                    Err(e) => return Err(e.into()),
                }
            }
            None => self.fresh_id()?,
        };

        Ok(Note::from_content(id, content, path.to_path_buf(), kind)?)
    }

    /// Renames the note's file to `<slug>.<id>.md` for its current title and
    /// stores the note.
    ///
    /// Returns whether the file was renamed. If the index update fails after
    /// a rename, the file is moved back and the note keeps its old path.
    pub fn repair(&mut self, note: &mut Note) -> SyncResult<bool> {
        let previous = self.rename_to_expected(note)?;

        match self.repo.save(NoteDraft::from(&*note)) {
            Ok(saved) => {
                *note = saved;
                Ok(previous.is_some())
            }
            Err(e) => {
                if let Some(previous) = previous {
                    self.restore_path(note, previous);
                }
                Err(e.into())
            }
        }
    }

    fn rename_to_expected(&self, note: &mut Note) -> SyncResult<Option<PathBuf>> {
        let expected = note.path().with_file_name(note.expected_filename());
        if expected == note.path() {
            return Ok(None);
        }

        self.vault.rename(note.path(), &expected)?;
        info!(
            "event=note_renamed id={} from={} to={}",
            note.id(),
            note.path().display(),
            expected.display()
        );
        let previous = note.path().to_path_buf();
        note.set_path(expected, note.kind());
        Ok(Some(previous))
    }

    fn restore_path(&self, note: &mut Note, previous: PathBuf) {
        match self.vault.rename(note.path(), &previous) {
            Ok(()) => {
                let kind = self.vault.kind_of(&previous).unwrap_or(note.kind());
                note.set_path(previous, kind);
            }
            Err(e) => warn!(
                "event=rename_rollback_failed path={} error={}",
                note.path().display(),
                e
            ),
        }
    }

    // ===========================================
    // Links
    // ===========================================

    /// Resolves the note's references and makes its stored edges match them.
    fn link_note(&mut self, note: &mut Note) -> SyncResult<()> {
        let mut unresolved = Vec::new();
        let targets = self.resolve_targets(note, &mut unresolved)?;

        let stale: Vec<NoteId> = note
            .links()
            .iter()
            .map(|n| n.id().clone())
            .filter(|id| !targets.contains(id))
            .collect();
        self.repo.unlink(note, &stale)?;
        self.repo.link(note, &targets)?;
        Ok(())
    }

    fn resolve_targets(
        &self,
        note: &Note,
        unresolved: &mut Vec<Unresolved>,
    ) -> SyncResult<Vec<NoteId>> {
        let mut targets = Vec::new();
        for reference in note.references() {
            match resolve_existing(&self.repo, &self.vault, &reference) {
                Ok(target) => {
                    if target.id() != note.id() && !targets.contains(target.id()) {
                        targets.push(target.id().clone());
                    }
                }
                Err(e) if e.is_not_found() => {
                    warn!(
                        "event=reference_unresolved from={} reference={}",
                        note.path().display(),
                        reference
                    );
                    unresolved.push(Unresolved {
                        from: note.id().clone(),
                        reference,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(targets)
    }

    /// Outbound links of the note stored at `path`. Targets whose file is
    /// gone are left out until the next sync prunes them.
    pub fn links(&self, path: &Path) -> SyncResult<Vec<Note>> {
        let note = self.get(path)?;
        Ok(self.on_disk(note.links().to_vec()))
    }

    /// Notes linking to the note stored at `path`.
    pub fn backlinks(&self, path: &Path) -> SyncResult<Vec<Note>> {
        let note = self.get(path)?;
        Ok(self.on_disk(self.repo.backlinks(note.id())?))
    }

    fn on_disk(&self, notes: Vec<Note>) -> Vec<Note> {
        notes
            .into_iter()
            .filter(|note| self.vault.exists(note.path()))
            .collect()
    }

    /// Every broken reference across the index, read from the files on disk.
    pub fn broken_links(&self) -> SyncResult<Vec<BrokenLink>> {
        Ok(scan_broken_links(&self.repo, &self.vault)?)
    }

    /// Broken references of a single note.
    pub fn broken_links_of(&self, path: &Path) -> SyncResult<Vec<BrokenLink>> {
        let note = self.get(path)?;
        Ok(note_broken_links(&self.repo, &self.vault, &note)?)
    }

    // ===========================================
    // Note Operations
    // ===========================================

    /// The indexed note stored at `path`.
    pub fn get(&self, path: &Path) -> SyncResult<Note> {
        let path = self.vault.normalize(path);
        Ok(self.repo.get(&NoteKey::Path(path))?)
    }

    /// Writes a new fleet note from the note template and indexes it.
    ///
    /// The stored title is whatever the rendered template puts on line 0,
    /// so the filename matches what the next `save` expects.
    pub fn create(&mut self, title: &str) -> SyncResult<Note> {
        let title = title.trim();
        if title.is_empty() {
            return Err(NoteError::EmptyTitle.into());
        }
        let id = self.fresh_id()?;
        let content = render_note_body(&self.vault.templates_dir(), title, &id)?;
        let fleet = self.vault.fleet_root().to_path_buf();
        let mut note = Note::from_content(id, content, fleet.clone(), NoteKind::Fleet)?;
        note.set_path(fleet.join(note.expected_filename()), NoteKind::Fleet);

        if self.vault.exists(note.path()) {
            return Err(SyncError::Exists {
                path: note.path().to_path_buf(),
            });
        }
        self.vault.write(note.path(), note.content())?;
        info!("event=note_created id={} path={}", note.id(), note.path().display());

        note = self.repo.save(NoteDraft::from(&note))?;
        self.repo.insert_history(note.id())?;
        self.link_note(&mut note)?;
        Ok(note)
    }

    /// Marks the note at `path` as opened, indexing it first if needed.
    pub fn open(&mut self, path: &Path) -> SyncResult<Note> {
        match self.get(path) {
            Ok(note) => {
                self.repo.insert_history(note.id())?;
                Ok(note)
            }
            Err(e) if e.is_not_found() => self.save(path),
            Err(e) => Err(e),
        }
    }

    /// Deletes the note's file and its index row, edges and history.
    ///
    /// A note file that was never indexed is still deleted.
    pub fn remove(&mut self, path: &Path) -> SyncResult<Note> {
        let note = match self.get(path) {
            Ok(note) => note,
            Err(e) if e.is_not_found() => {
                let path = self.vault.normalize(path);
                let note = self.read(&path)?;
                self.vault.remove(note.path())?;
                info!(
                    "event=note_removed id={} path={} indexed=false",
                    note.id(),
                    note.path().display()
                );
                return Ok(note);
            }
            Err(e) => return Err(e),
        };
        if self.vault.exists(note.path()) {
            self.vault.remove(note.path())?;
        }
        self.repo.remove(note.id())?;
        info!("event=note_removed id={} path={}", note.id(), note.path().display());
        Ok(note)
    }

    /// Moves a fleet note into the permanent area.
    pub fn promote(&mut self, path: &Path) -> SyncResult<Note> {
        let path = self.vault.normalize(path);
        let mut note = match self.repo.get(&NoteKey::Path(path.clone())) {
            Ok(note) => note,
            Err(e) if e.is_not_found() => self.save(&path)?,
            Err(e) => return Err(e.into()),
        };
        if note.kind() == NoteKind::Permanent {
            return Err(SyncError::AlreadyPermanent { path });
        }

        let previous = note.path().to_path_buf();
        let target = self
            .vault
            .permanent_root()
            .join(note.expected_filename());
        self.vault.rename(&previous, &target)?;
        note.set_path(target, NoteKind::Permanent);

        match self.repo.save(NoteDraft::from(&note)) {
            Ok(saved) => note = saved,
            Err(e) => {
                self.restore_path(&mut note, previous);
                return Err(e.into());
            }
        }
        self.repo.insert_history(note.id())?;
        info!("event=note_promoted id={} path={}", note.id(), note.path().display());
        Ok(note)
    }

    pub fn history(&self) -> SyncResult<Vec<Note>> {
        Ok(self.repo.history()?)
    }

    /// Fleet notes waiting to be curated, most recent first.
    pub fn backlog(&self) -> SyncResult<Vec<Note>> {
        Ok(self.repo.list_fleet()?)
    }

    pub fn last(&self) -> SyncResult<Note> {
        Ok(self.repo.last_opened()?)
    }

    pub fn search(&self, query: &str) -> SyncResult<Vec<Note>> {
        Ok(self.repo.search(query)?)
    }

    /// Draws ids until one is neither on disk nor in the index.
    fn fresh_id(&mut self) -> SyncResult<NoteId> {
        loop {
            let id = self.ids.next_id();
            match self.repo.get(&NoteKey::Id(id.clone())) {
                Ok(_) => continue,
                Err(e) if e.is_not_found() => return Ok(id),
                Err(e) => return Err(e.into()),
            }
        }
    }
}
