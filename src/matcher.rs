/// Byte-set membership used for quote, escape, and trim classification.
///
/// A disabled matcher (the empty set) never matches anything, mirroring how
/// an unconfigured feature costs a single branch per byte at most.
#[derive(Clone)]
pub(crate) struct ByteMatcher {
    table: [bool; 256],
    enabled: bool,
}

impl ByteMatcher {
    pub(crate) fn disabled() -> Self {
        Self {
            table: [false; 256],
            enabled: false,
        }
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        let mut table = [false; 256];
        for &b in bytes {
            table[b as usize] = true;
        }
        Self {
            table,
            enabled: !bytes.is_empty(),
        }
    }

    #[inline]
    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub(crate) fn matches(&self, byte: u8) -> bool {
        self.table[byte as usize]
    }

    /// True when any byte belongs to both sets. Used by the option
    /// validator to reject overlapping quote/escape/trim configurations.
    pub(crate) fn intersects(&self, other: &ByteMatcher) -> bool {
        if !self.enabled || !other.enabled {
            return false;
        }
        (0..256).any(|i| self.table[i] && other.table[i])
    }
}

impl std::fmt::Debug for ByteMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes: Vec<u8> = (0..256u16)
            .filter(|&i| self.table[i as usize])
            .map(|i| i as u8)
            .collect();
        f.debug_struct("ByteMatcher")
            .field("enabled", &self.enabled)
            .field("bytes", &bytes)
            .finish()
    }
}
