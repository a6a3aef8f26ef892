// lzw.rs
//
// Copyright (c) 2020-2023  Douglas Lau
//
//! Lempel-Ziv-Welch compression for GIF
use std::cmp::Ordering;
use std::io;
use std::ops::AddAssign;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> u16 {
        1 << (self.0 as u16)
    }
}

/// Code type
type Code = u16;

/// Receiver of compressed codes, in emission order
pub(crate) trait CodeSink {
    /// Push one code with the given bit width
    fn push_code(&mut self, code: Code, bits: u8) -> io::Result<()>;
}

/// Node for code dictionary
///
/// Children of a code form a binary tree, ordered by byte value.
#[derive(Clone, Copy, Debug)]
struct Node {
    /// First child code
    next: Option<Code>,
    /// Sibling with lesser byte
    left: Option<Code>,
    /// Sibling with greater byte
    right: Option<Code>,
    /// Byte value
    byte: u8,
}

impl Node {
    fn new(byte: u8) -> Self {
        Node {
            next: None,
            left: None,
            right: None,
            byte,
        }
    }

    /// Get a link code
    fn link(&self, ordering: Ordering) -> Option<Code> {
        match ordering {
            Ordering::Less => self.left,
            Ordering::Equal => self.next,
            Ordering::Greater => self.right,
        }
    }

    /// Set a link code
    fn set_link(&mut self, ordering: Ordering, code: Code) {
        match ordering {
            Ordering::Less => self.left = Some(code),
            Ordering::Equal => self.next = Some(code),
            Ordering::Greater => self.right = Some(code),
        }
    }
}

/// Code dictionary trie, keyed by (prefix code, byte)
#[derive(Debug)]
struct Trie {
    /// Table of codes
    table: Vec<Node>,
    /// Minimum code bits
    min_code_bits: u8,
}

impl Trie {
    /// Create a new code dictionary
    fn new(min_code_bits: u8) -> Self {
        let mut trie = Trie {
            table: Vec::with_capacity(Bits::MAX.entries().into()),
            min_code_bits,
        };
        trie.reset();
        trie
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the next available code
    fn next_code(&self) -> Code {
        self.table.len() as Code
    }

    /// Check if every code has been assigned
    fn is_full(&self) -> bool {
        self.next_code() >= Bits::MAX.entries()
    }

    /// Reset the dictionary to one code per byte
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            self.table.push(Node::new(byte as u8));
        }
        self.table.push(Node::new(0)); // clear code
        self.table.push(Node::new(0)); // end code
    }

    /// Search for a code extended by one byte.
    ///
    /// If not found, the extension is inserted (unless full) and `None` is
    /// returned.
    fn search_insert(&mut self, code: Code, byte: u8) -> Option<Code> {
        let mut parent = code;
        let mut ordering = Ordering::Equal;
        while let Some(child) = self.table[parent as usize].link(ordering) {
            ordering = byte.cmp(&self.table[child as usize].byte);
            if ordering == Ordering::Equal {
                return Some(child);
            }
            parent = child;
        }
        if !self.is_full() {
            let next_code = self.next_code();
            self.table[parent as usize].set_link(ordering, next_code);
            self.table.push(Node::new(byte));
        }
        None
    }
}

/// LZW Data Compressor
pub(crate) struct Compressor {
    /// Code dictionary
    trie: Trie,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
}

impl Compressor {
    /// Create a new compressor
    pub fn new(min_code_bits: u8) -> Self {
        debug_assert!(min_code_bits >= 2 && min_code_bits <= 8);
        Compressor {
            trie: Trie::new(min_code_bits),
            min_code_bits,
            code_bits: Bits::from(min_code_bits + 1),
        }
    }

    /// Reset dictionary and code bits
    fn reset(&mut self) {
        self.trie.reset();
        self.code_bits = Bits::from(self.min_code_bits + 1);
    }

    /// Push a code at the current width
    fn push<S: CodeSink>(&self, code: Code, sink: &mut S) -> io::Result<()> {
        sink.push_code(code, self.code_bits.into())
    }

    /// Adjust code bits after a code was added, or clear a full dictionary
    fn adjust<S: CodeSink>(&mut self, sink: &mut S) -> io::Result<()> {
        if self.trie.is_full() {
            trace!("LZW dictionary full; clearing");
            self.push(self.trie.clear_code(), sink)?;
            self.reset();
        } else if self.trie.next_code() > self.code_bits.entries() {
            self.code_bits += 1;
        }
        Ok(())
    }

    /// Compress a sequence of bytes into a code sink.
    ///
    /// Every byte must be less than the clear code.
    pub fn compress<I, S>(&mut self, bytes: I, sink: &mut S) -> io::Result<()>
    where
        I: IntoIterator<Item = u8>,
        S: CodeSink,
    {
        self.reset();
        self.push(self.trie.clear_code(), sink)?;
        let mut code = None;
        for byte in bytes {
            debug_assert!(Code::from(byte) < self.trie.clear_code());
            code = match code {
                None => Some(Code::from(byte)),
                Some(prefix) => match self.trie.search_insert(prefix, byte) {
                    Some(c) => Some(c),
                    None => {
                        self.push(prefix, sink)?;
                        self.adjust(sink)?;
                        Some(Code::from(byte))
                    }
                },
            };
        }
        if let Some(code) = code {
            self.push(code, sink)?;
            // decoder adds one more code after reading the last one
            if self.trie.next_code() == self.code_bits.entries() {
                self.code_bits += 1;
            }
        }
        self.push(self.trie.end_code(), sink)
    }
}
