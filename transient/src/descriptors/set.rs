use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use crate::types::{CpuDescriptorHandle, DescriptorKind};

/// Multiplier of the rolling hash.
const HASH_BASE: u64 = 0x0000_0100_0000_01b3;

/// Handle payload of a [`DescriptorSet`].
#[derive(Debug, Clone)]
pub enum DescriptorHandles<'a> {
    /// Explicit ordered handles. May contain null handles.
    List(Cow<'a, [CpuDescriptorHandle]>),
    /// `count` handles starting at `base`, `stride` bytes apart.
    Run {
        /// First handle of the run.
        base: CpuDescriptorHandle,
        /// Number of handles.
        count: u32,
        /// Byte distance between handles, the heap type's increment size.
        stride: u32,
    },
}

/// An immutable, typed group of descriptors to be made GPU-visible together.
///
/// Equality and hashing are defined over the expanded handle sequence and the
/// kind, so a run and a list naming the same handles are the same set.
#[derive(Debug, Clone)]
pub struct DescriptorSet<'a> {
    kind: DescriptorKind,
    handles: DescriptorHandles<'a>,
}

impl<'a> DescriptorSet<'a> {
    /// A set borrowing an explicit handle list.
    pub fn list(kind: DescriptorKind, handles: &'a [CpuDescriptorHandle]) -> Self {
        Self {
            kind,
            handles: DescriptorHandles::List(Cow::Borrowed(handles)),
        }
    }

    /// A set owning its handle list.
    pub fn from_vec(kind: DescriptorKind, handles: Vec<CpuDescriptorHandle>) -> Self {
        Self {
            kind,
            handles: DescriptorHandles::List(Cow::Owned(handles)),
        }
    }

    /// A contiguous run of `count` descriptors starting at `base`.
    pub fn run(kind: DescriptorKind, base: CpuDescriptorHandle, count: u32, stride: u32) -> Self {
        Self {
            kind,
            handles: DescriptorHandles::Run {
                base,
                count,
                stride,
            },
        }
    }

    /// View type of the descriptors.
    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// Handle payload.
    pub fn handles(&self) -> &DescriptorHandles<'a> {
        &self.handles
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        match &self.handles {
            DescriptorHandles::List(list) => list.len(),
            DescriptorHandles::Run { count, .. } => *count as usize,
        }
    }

    /// Whether the set has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle at `index`.
    pub fn handle(&self, index: usize) -> Option<CpuDescriptorHandle> {
        match &self.handles {
            DescriptorHandles::List(list) => list.get(index).copied(),
            DescriptorHandles::Run {
                base,
                count,
                stride,
            } => (index < *count as usize).then(|| base.offset(index as u32, *stride)),
        }
    }

    /// Iterate over the expanded handles.
    pub fn iter(&self) -> impl Iterator<Item = CpuDescriptorHandle> + '_ {
        (0..self.len()).filter_map(move |i| self.handle(i))
    }

    /// Detach the set from borrowed data.
    pub fn into_owned(self) -> DescriptorSet<'static> {
        let handles = match self.handles {
            DescriptorHandles::List(list) => DescriptorHandles::List(Cow::Owned(list.into_owned())),
            DescriptorHandles::Run {
                base,
                count,
                stride,
            } => DescriptorHandles::Run {
                base,
                count,
                stride,
            },
        };
        DescriptorSet {
            kind: self.kind,
            handles,
        }
    }

    /// Rolling hash over the handle words, seeded with the kind.
    pub fn calc_hash(&self) -> u64 {
        let seed = self.kind as u64 + 1;
        self.iter().fold(seed, |hash, handle| {
            hash.wrapping_mul(HASH_BASE).wrapping_add(handle.ptr as u64)
        })
    }

    /// Whether any handle is null.
    pub fn has_null(&self) -> bool {
        match &self.handles {
            DescriptorHandles::List(list) => list.iter().any(|h| h.is_null()),
            DescriptorHandles::Run { base, count, .. } => *count > 0 && base.is_null(),
        }
    }

    /// Whether `handle` is one of the set's descriptors. Null never matches.
    pub fn has_handle(&self, handle: CpuDescriptorHandle) -> bool {
        if handle.is_null() {
            return false;
        }
        match &self.handles {
            DescriptorHandles::List(list) => list.contains(&handle),
            DescriptorHandles::Run {
                base,
                count,
                stride,
            } => run_contains(*base, *count, *stride, handle),
        }
    }

    /// Whether the two sets share at least one non-null handle.
    pub fn has_intersection(&self, other: &DescriptorSet<'_>) -> bool {
        match (&self.handles, &other.handles) {
            (
                DescriptorHandles::Run {
                    base: a,
                    count: a_count,
                    stride: a_stride,
                },
                DescriptorHandles::Run {
                    base: b,
                    count: b_count,
                    stride: b_stride,
                },
            ) if a_stride == b_stride && *a_stride != 0 => {
                let stride = *a_stride as usize;
                let start = a.ptr.max(b.ptr);
                let a_end = a.ptr + *a_count as usize * stride;
                let b_end = b.ptr + *b_count as usize * stride;
                let end = a_end.min(b_end);
                // Overlapping runs only share handles when they are in phase.
                // Address zero is the null handle and never counts.
                let first = if start == 0 { stride } else { start };
                a.ptr.abs_diff(b.ptr) % stride == 0 && first < end
            }
            (DescriptorHandles::Run { .. }, DescriptorHandles::Run { .. }) => {
                let (small, large) = if self.len() <= other.len() {
                    (self, other)
                } else {
                    (other, self)
                };
                small.iter().any(|h| large.has_handle(h))
            }
            (DescriptorHandles::Run { .. }, DescriptorHandles::List(list)) => {
                list.iter().any(|&h| self.has_handle(h))
            }
            (DescriptorHandles::List(list), _) => list.iter().any(|&h| other.has_handle(h)),
        }
    }
}

fn run_contains(
    base: CpuDescriptorHandle,
    count: u32,
    stride: u32,
    handle: CpuDescriptorHandle,
) -> bool {
    if count == 0 || handle.ptr < base.ptr {
        return false;
    }
    let diff = handle.ptr - base.ptr;
    if stride == 0 {
        return diff == 0;
    }
    diff % stride as usize == 0 && diff / (stride as usize) < count as usize
}

impl<'b> PartialEq<DescriptorSet<'b>> for DescriptorSet<'_> {
    fn eq(&self, other: &DescriptorSet<'b>) -> bool {
        if self.kind != other.kind || self.len() != other.len() {
            return false;
        }
        match (&self.handles, &other.handles) {
            (DescriptorHandles::List(a), DescriptorHandles::List(b)) => {
                std::ptr::eq(a.as_ptr(), b.as_ptr()) || a[..] == b[..]
            }
            (
                DescriptorHandles::Run {
                    base: a,
                    stride: a_stride,
                    ..
                },
                DescriptorHandles::Run {
                    base: b,
                    stride: b_stride,
                    ..
                },
            ) if a == b && a_stride == b_stride => true,
            _ => self.iter().eq(other.iter()),
        }
    }
}

impl Eq for DescriptorSet<'_> {}

impl Hash for DescriptorSet<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.calc_hash());
    }
}
