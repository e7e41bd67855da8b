//! In-memory ZettelRepository used as a test double.
//!
//! Mirrors the SQLite semantics that callers rely on: upserts that only move
//! `updated_at` on change, idempotent edges, cascading removal and a bounded
//! history view. Search is a plain case-insensitive term match.

use crate::domain::{IdGenerator, LinkEdge, Note, NoteDraft, NoteId, NoteKey, NoteKind};
use crate::index::repository::{complete_draft, unused_id};
use crate::index::{HISTORY_LIMIT, IndexError, IndexResult, ZettelRepository};
use crate::infra::Vault;
use chrono::Utc;
use std::collections::BTreeMap;

pub struct MemoryIndex {
    vault: Vault,
    ids: IdGenerator,
    notes: BTreeMap<NoteId, Note>,
    // insertion order is the outbound link order
    links: Vec<LinkEdge>,
    history: BTreeMap<NoteId, u64>,
    touched: u64,
}

impl MemoryIndex {
    pub fn new(vault: Vault) -> Self {
        Self {
            vault,
            ids: IdGenerator::new(),
            notes: BTreeMap::new(),
            links: Vec::new(),
            history: BTreeMap::new(),
            touched: 0,
        }
    }

    fn complete(&mut self, draft: NoteDraft) -> IndexResult<Note> {
        let notes = &self.notes;
        let ids = &mut self.ids;
        complete_draft(draft, &self.vault, || {
            unused_id(ids, |id| Ok(notes.contains_key(id)))
        })
    }

    fn upsert(&mut self, mut note: Note) -> IndexResult<()> {
        if let Some(owner) = self
            .notes
            .values()
            .find(|n| n.path() == note.path() && n.id() != note.id())
        {
            return Err(IndexError::Conflict {
                path: note.path().to_path_buf(),
                owner: owner.id().clone(),
            });
        }

        let now = Utc::now();
        let created = match self.notes.get(note.id()) {
            Some(existing) if existing.same_record(&note) => return Ok(()),
            Some(existing) => existing.created_at().unwrap_or(now),
            None => now,
        };
        note.set_timestamps(created, now);
        self.notes.insert(note.id().clone(), note);
        Ok(())
    }

    fn require(&self, id: &NoteId) -> IndexResult<&Note> {
        self.notes
            .get(id)
            .ok_or_else(|| IndexError::not_found(&NoteKey::Id(id.clone())))
    }

    fn outbound(&self, id: &NoteId) -> Vec<Note> {
        self.links
            .iter()
            .filter(|edge| &edge.from == id)
            .filter_map(|edge| self.notes.get(&edge.to).cloned())
            .collect()
    }

    fn add_edges(&mut self, edges: &[LinkEdge]) -> IndexResult<()> {
        for edge in edges {
            self.require(&edge.from)?;
            self.require(&edge.to)?;
        }
        for edge in edges {
            if !self.links.contains(edge) {
                self.links.push(edge.clone());
            }
        }
        Ok(())
    }

    fn drop_edges(&mut self, edges: &[LinkEdge]) {
        self.links.retain(|edge| !edges.contains(edge));
    }

    fn sorted(&self, filter: impl Fn(&Note) -> bool) -> Vec<Note> {
        let mut notes: Vec<Note> = self.notes.values().filter(|n| filter(n)).cloned().collect();
        notes.sort_by(|a, b| {
            b.updated_at()
                .cmp(&a.updated_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        notes
    }

    fn by_history(&self) -> Vec<Note> {
        let mut entries: Vec<(&NoteId, &u64)> = self.history.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(a.1));
        entries
            .into_iter()
            .filter_map(|(id, _)| self.notes.get(id).cloned())
            .collect()
    }
}

impl ZettelRepository for MemoryIndex {
    fn get(&self, key: &NoteKey) -> IndexResult<Note> {
        let found = match key {
            NoteKey::Id(id) => self.notes.get(id).cloned(),
            NoteKey::Path(path) => self.notes.values().find(|n| n.path() == path).cloned(),
            NoteKey::Slug(slug) => self
                .sorted(|n| n.slug() == slug)
                .into_iter()
                .next(),
        };
        let mut note = found.ok_or_else(|| IndexError::not_found(key))?;
        note.set_links(self.outbound(note.id()));
        Ok(note)
    }

    fn save(&mut self, draft: NoteDraft) -> IndexResult<Note> {
        let note = self.complete(draft)?;
        let id = note.id().clone();
        self.upsert(note)?;
        self.get(&NoteKey::Id(id))
    }

    fn save_bulk(&mut self, drafts: Vec<NoteDraft>) -> IndexResult<Vec<Note>> {
        let notes = drafts
            .into_iter()
            .map(|draft| self.complete(draft))
            .collect::<IndexResult<Vec<_>>>()?;

        // all-or-nothing, like the SQLite transaction
        let snapshot = self.notes.clone();
        let mut ids = Vec::with_capacity(notes.len());
        for note in notes {
            ids.push(note.id().clone());
            if let Err(e) = self.upsert(note) {
                self.notes = snapshot;
                return Err(e);
            }
        }

        ids.iter().map(|id| self.get(&NoteKey::Id(id.clone()))).collect()
    }

    fn link(&mut self, note: &mut Note, targets: &[NoteId]) -> IndexResult<()> {
        let edges: Vec<LinkEdge> = targets
            .iter()
            .map(|to| LinkEdge::new(note.id().clone(), to.clone()))
            .collect();
        self.add_edges(&edges)?;
        note.set_links(self.outbound(note.id()));
        Ok(())
    }

    fn link_bulk(&mut self, edges: &[LinkEdge]) -> IndexResult<()> {
        self.add_edges(edges)
    }

    fn unlink(&mut self, note: &mut Note, targets: &[NoteId]) -> IndexResult<()> {
        let edges: Vec<LinkEdge> = targets
            .iter()
            .map(|to| LinkEdge::new(note.id().clone(), to.clone()))
            .collect();
        self.drop_edges(&edges);
        note.set_links(self.outbound(note.id()));
        Ok(())
    }

    fn unlink_bulk(&mut self, edges: &[LinkEdge]) -> IndexResult<()> {
        self.drop_edges(edges);
        Ok(())
    }

    fn edges(&self) -> IndexResult<Vec<LinkEdge>> {
        let mut edges = self.links.clone();
        edges.sort();
        Ok(edges)
    }

    fn remove(&mut self, id: &NoteId) -> IndexResult<()> {
        if self.remove_bulk(std::slice::from_ref(id))? == 0 {
            return Err(IndexError::not_found(&NoteKey::Id(id.clone())));
        }
        Ok(())
    }

    fn remove_bulk(&mut self, ids: &[NoteId]) -> IndexResult<usize> {
        let mut removed = 0;
        for id in ids {
            if self.notes.remove(id).is_some() {
                removed += 1;
                self.links.retain(|edge| &edge.from != id && &edge.to != id);
                self.history.remove(id);
            }
        }
        Ok(removed)
    }

    fn backlinks(&self, id: &NoteId) -> IndexResult<Vec<Note>> {
        let sources: Vec<&NoteId> = self
            .links
            .iter()
            .filter(|edge| &edge.to == id)
            .map(|edge| &edge.from)
            .collect();
        Ok(self.sorted(|n| sources.contains(&n.id())))
    }

    fn list_fleet(&self) -> IndexResult<Vec<Note>> {
        Ok(self.sorted(|n| n.kind() == NoteKind::Fleet))
    }

    fn list_permanent(&self) -> IndexResult<Vec<Note>> {
        Ok(self.sorted(|n| n.kind() == NoteKind::Permanent))
    }

    fn list_all(&self) -> IndexResult<Vec<Note>> {
        Ok(self.sorted(|_| true))
    }

    fn history(&self) -> IndexResult<Vec<Note>> {
        let mut notes = self.by_history();
        notes.truncate(HISTORY_LIMIT);
        Ok(notes)
    }

    fn insert_history(&mut self, id: &NoteId) -> IndexResult<()> {
        self.require(id)?;
        self.touched += 1;
        self.history.insert(id.clone(), self.touched);
        Ok(())
    }

    fn last_opened(&self) -> IndexResult<Note> {
        self.by_history()
            .into_iter()
            .next()
            .ok_or_else(|| IndexError::NotFound {
                key: "history entry".to_string(),
            })
    }

    fn search(&self, query: &str) -> IndexResult<Vec<Note>> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<(usize, Note)> = self
            .notes
            .values()
            .filter_map(|note| {
                let title = note.title().to_lowercase();
                let content = note.content().to_lowercase();
                let mut score = 0;
                for term in &terms {
                    let in_title = title.matches(term.as_str()).count();
                    let in_content = content.matches(term.as_str()).count();
                    if in_title + in_content == 0 {
                        return None;
                    }
                    score += in_title * 10 + in_content;
                }
                Some((score, note.clone()))
            })
            .collect();

        hits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id().cmp(b.1.id())));
        Ok(hits.into_iter().map(|(_, note)| note).collect())
    }

    fn reset(&mut self) -> IndexResult<()> {
        self.notes.clear();
        self.links.clear();
        self.history.clear();
        Ok(())
    }
}
