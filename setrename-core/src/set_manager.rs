use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Number of files grouped together by a single assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SetSize {
    One,
    Two,
    Three,
}

impl SetSize {
    pub fn get(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    fn counter_slot(self) -> Option<usize> {
        match self {
            Self::One => None,
            Self::Two => Some(0),
            Self::Three => Some(1),
        }
    }
}

impl TryFrom<u8> for SetSize {
    type Error = AddSetError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(AddSetError::UnsupportedSize(other)),
        }
    }
}

impl fmt::Display for SetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Identity of a set.
///
/// Size-1 assignments all land in one cumulative bucket (`set1`), larger
/// assignments each get their own numbered set (`set2-no1`, `set3-no4`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetKind {
    Cumulative,
    Numbered { size: SetSize, index: u32 },
}

impl SetKind {
    pub fn size(&self) -> SetSize {
        match self {
            Self::Cumulative => SetSize::One,
            Self::Numbered { size, .. } => *size,
        }
    }

    pub fn is_cumulative(&self) -> bool {
        matches!(self, Self::Cumulative)
    }
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cumulative => write!(f, "set1"),
            Self::Numbered { size, index } => write!(f, "set{}-no{}", size, index),
        }
    }
}

// Sets are processed in lexicographic order of their rendered names, so
// `set2-no10` sorts before `set2-no2`. Existing collections depend on it.
impl Ord for SetKind {
    fn cmp(&self, other: &Self) -> Ordering {
        // The size digit is the first place rendered names differ
        self.size().cmp(&other.size()).then_with(|| match (self, other) {
            (Self::Numbered { index: a, .. }, Self::Numbered { index: b, .. }) => {
                decimal_digits(*a).as_slice().cmp(decimal_digits(*b).as_slice())
            },
            _ => Ordering::Equal,
        })
    }
}

/// ASCII decimal rendering of `n` without allocating
struct Digits {
    buf: [u8; 10],
    start: usize,
}

impl Digits {
    fn as_slice(&self) -> &[u8] {
        &self.buf[self.start..]
    }
}

fn decimal_digits(mut n: u32) -> Digits {
    let mut buf = [0u8; 10];
    let mut start = buf.len();
    loop {
        start -= 1;
        buf[start] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    Digits { buf, start }
}

impl PartialOrd for SetKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for SetKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for SetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "set1" {
            return Ok(Self::Cumulative);
        }

        let (size, index) = s
            .strip_prefix("set")
            .and_then(|rest| rest.split_once("-no"))
            .ok_or_else(|| format!("Invalid set name: {}", s))?;

        let size = match size {
            "2" => SetSize::Two,
            "3" => SetSize::Three,
            _ => return Err(format!("Invalid set size in name: {}", s)),
        };
        let index = index
            .parse::<u32>()
            .ok()
            .filter(|i| *i > 0)
            .ok_or_else(|| format!("Invalid set number in name: {}", s))?;

        Ok(Self::Numbered { size, index })
    }
}

/// Reasons an assignment is declined. A declined assignment never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddSetError {
    #[error("No files selected")]
    EmptySelection,
    #[error("You must select exactly {size} files (got {got})")]
    WrongCount { size: SetSize, got: usize },
    #[error("Unsupported set size: {0} (expected 1, 2 or 3)")]
    UnsupportedSize(u8),
}

/// Result of a successful undo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoneSet {
    pub set: SetKind,
    /// Paths released from set membership by this undo
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
struct Assignment {
    set: SetKind,
    paths: Vec<PathBuf>,
}

/// In-memory bookkeeping of the sets assigned during one grouping session
#[derive(Debug, Clone, Default)]
pub struct SetManager {
    sets: BTreeMap<SetKind, Vec<PathBuf>>,
    history: Vec<Assignment>,
    // Last allocated index for sizes 2 and 3
    counters: [u32; 2],
}

impl SetManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new assignment of `paths` as a set of `size` files.
    pub fn add_set(&mut self, size: SetSize, paths: Vec<PathBuf>) -> Result<SetKind, AddSetError> {
        if paths.is_empty() {
            return Err(AddSetError::EmptySelection);
        }

        let set = match size.counter_slot() {
            None => {
                self.sets
                    .entry(SetKind::Cumulative)
                    .or_default()
                    .extend(paths.iter().cloned());
                SetKind::Cumulative
            },
            Some(slot) => {
                if paths.len() != size.get() {
                    return Err(AddSetError::WrongCount {
                        size,
                        got: paths.len(),
                    });
                }
                self.counters[slot] += 1;
                let set = SetKind::Numbered {
                    size,
                    index: self.counters[slot],
                };
                self.sets.insert(set, paths.clone());
                set
            },
        };

        self.history.push(Assignment { set, paths });
        Ok(set)
    }

    /// Revert the most recent successful `add_set`.
    pub fn undo_last_set(&mut self) -> Option<UndoneSet> {
        let Assignment { set, paths } = self.history.pop()?;

        match set {
            SetKind::Numbered { size, .. } => {
                self.sets.remove(&set);
                if let Some(slot) = size.counter_slot() {
                    self.counters[slot] -= 1;
                }
            },
            SetKind::Cumulative => {
                if let Some(members) = self.sets.get_mut(&set) {
                    members.retain(|member| !paths.contains(member));
                    if members.is_empty() {
                        self.sets.remove(&set);
                    }
                }
            },
        }

        Some(UndoneSet { set, paths })
    }

    pub fn get_all_sets(&self) -> &BTreeMap<SetKind, Vec<PathBuf>> {
        &self.sets
    }

    pub fn reset(&mut self) {
        self.sets.clear();
        self.history.clear();
        self.counters = [0; 2];
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Total number of files across all sets
    pub fn member_count(&self) -> usize {
        self.sets.values().map(Vec::len).sum()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Index the next numbered set of `size` would receive, `None` for size 1
    pub fn next_index(&self, size: SetSize) -> Option<u32> {
        size.counter_slot().map(|slot| self.counters[slot] + 1)
    }
}
