use crate::tags::{normalize, TagMatcher};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Groups the built-in tag vocabulary is organized in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TagGroup {
    Positions,
    Submissions,
    Techniques,
    Attire,
    General,
}

impl TagGroup {
    fn from_header(header: &str) -> Self {
        match header.trim().to_lowercase().as_str() {
            "positions" => TagGroup::Positions,
            "submissions" => TagGroup::Submissions,
            "techniques" => TagGroup::Techniques,
            "attire" => TagGroup::Attire,
            _ => TagGroup::General,
        }
    }
}

/// Known BJJ tag names used to tag imported clips by their file names
#[derive(Debug, Clone)]
pub struct TagVocabulary {
    terms: HashMap<TagGroup, Vec<String>>,
}

impl TagVocabulary {
    /// Vocabulary with the default terms
    pub fn new() -> Self {
        let mut vocabulary = Self::empty();
        vocabulary.load_default_terms();
        vocabulary
    }

    /// Vocabulary without any terms
    pub fn empty() -> Self {
        Self {
            terms: HashMap::new(),
        }
    }

    /// Default terms plus the ones listed in a vocabulary file.
    ///
    /// One tag per line, `[group]` headers switch the group, `#` starts a comment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut vocabulary = Self::new();
        vocabulary.parse_terms(&content);
        info!("📚 Loaded tag vocabulary from: {}", path.as_ref().display());
        Ok(vocabulary)
    }

    pub fn terms(&self, group: TagGroup) -> &[String] {
        self.terms.get(&group).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every term, without duplicates, in group order
    pub fn all_terms(&self) -> Vec<String> {
        let order = [
            TagGroup::Positions,
            TagGroup::Submissions,
            TagGroup::Techniques,
            TagGroup::Attire,
            TagGroup::General,
        ];
        let mut seen = std::collections::HashSet::new();
        order
            .iter()
            .flat_map(|group| self.terms(*group).iter())
            .filter(|term| seen.insert(normalize(term)))
            .cloned()
            .collect()
    }

    pub fn add_term(&mut self, group: TagGroup, term: &str) {
        let term = term.trim();
        if !term.is_empty() {
            self.terms.entry(group).or_default().push(term.to_string());
        }
    }

    /// Whether `term` is known, ignoring case and punctuation
    pub fn contains(&self, term: &str) -> bool {
        let wanted = normalize(term);
        self.terms.values().flatten().any(|t| normalize(t) == wanted)
    }

    pub fn len(&self) -> usize {
        self.terms.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Matcher over the vocabulary and `extra` tag names (e.g. tags already stored).
    ///
    /// Extra names come first so an existing spelling is reused.
    pub fn matcher<I, S>(&self, extra: I) -> TagMatcher
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = extra.into_iter().map(|s| s.as_ref().to_string()).collect();
        names.extend(self.all_terms());
        TagMatcher::new(names)
    }

    /// Tags mentioned in a file name (`Closed_Guard_Armbar.mp4` → closed guard, armbar)
    pub fn tags_in_filename(&self, matcher: &TagMatcher, filename: &str) -> Vec<String> {
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        matcher.match_query(&stem)
    }

    fn load_default_terms(&mut self) {
        let positions = [
            "guard", "closed guard", "open guard", "half guard", "deep half guard",
            "z guard", "butterfly guard", "spider guard", "lasso guard", "de la riva",
            "reverse de la riva", "x guard", "single leg x", "50 50", "k guard",
            "rubber guard", "lockdown", "mount", "high mount", "s mount", "back control",
            "back mount", "side control", "north south", "knee on belly", "turtle",
            "kesa gatame", "headquarters", "ashi garami", "saddle", "crab ride",
        ];

        let submissions = [
            "armbar", "triangle", "arm triangle", "kimura", "americana", "omoplata",
            "gogoplata", "guillotine", "darce", "anaconda", "rear naked choke",
            "bow and arrow", "cross collar choke", "ezekiel", "loop choke",
            "baseball bat choke", "north south choke", "heel hook", "kneebar",
            "toe hold", "ankle lock", "calf slicer", "bicep slicer", "wrist lock",
            "tarikoplata", "baratoplata",
        ];

        let techniques = [
            "sweep", "pass", "guard pass", "escape", "takedown", "single leg",
            "double leg", "ankle pick", "arm drag", "snap down", "foot sweep", "throw",
            "berimbolo", "leg drag", "knee cut", "knee slice", "torreando", "smash pass",
            "stack pass", "body lock", "hip escape", "shrimp", "bridge", "granby roll",
            "technical stand up", "wrestling up", "back take", "guard retention",
            "guard pull", "reversal", "counter", "drill",
        ];

        let attire = ["gi", "no gi"];

        for (group, terms) in [
            (TagGroup::Positions, &positions[..]),
            (TagGroup::Submissions, &submissions[..]),
            (TagGroup::Techniques, &techniques[..]),
            (TagGroup::Attire, &attire[..]),
        ] {
            for term in terms {
                self.add_term(group, term);
            }
        }
    }

    fn parse_terms(&mut self, content: &str) {
        let mut current = TagGroup::General;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current = TagGroup::from_header(header);
                continue;
            }

            self.add_term(current, line);
        }
    }
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::new()
    }
}
