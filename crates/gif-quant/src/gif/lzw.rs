//! Variable-width LZW as used by GIF image data.
//!
//! Codes are packed least-significant-bit first. The encoder starts every
//! stream with a clear code, grows the code width up to 12 bits and emits
//! a clear code whenever the string table reaches 4096 entries.

use super::error::LzwError;

/// Largest code width GIF allows.
pub const MAX_CODE_WIDTH: u8 = 12;

/// Number of codes a 12-bit table can hold.
pub const MAX_TABLE_SIZE: usize = 1 << MAX_CODE_WIDTH;

/// Minimum code size for a color table with `palette_len` entries.
///
/// GIF requires at least 2, even for 2-color tables.
pub fn min_code_size(palette_len: usize) -> u8 {
    let mut bits = 2u8;
    while (1usize << bits) < palette_len {
        bits += 1;
    }
    bits
}

/// Accumulates codes into bytes, low bits first.
struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    nbits: u8,
}

impl BitWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            out: Vec::with_capacity(capacity),
            acc: 0,
            nbits: 0,
        }
    }

    fn write(&mut self, code: u16, width: u8) {
        self.acc |= (code as u32) << self.nbits;
        self.nbits += width;
        while self.nbits >= 8 {
            self.out.push(self.acc as u8);
            self.acc >>= 8;
            self.nbits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.out.push(self.acc as u8);
        }
        self.out
    }
}

/// Encoder string table keyed by `(prefix << 8) | suffix`.
///
/// The arena covers every possible key; 0 means no entry since every real
/// entry is at least the first free code. Keys set since the last reset
/// are remembered, so a reset clears at most 4096 slots.
struct CodeTable {
    slots: Vec<u16>,
    used: Vec<usize>,
}

impl CodeTable {
    fn new() -> Self {
        Self {
            slots: vec![0; MAX_TABLE_SIZE << 8],
            used: Vec::with_capacity(MAX_TABLE_SIZE),
        }
    }

    #[inline]
    fn get(&self, key: usize) -> u16 {
        self.slots[key]
    }

    #[inline]
    fn insert(&mut self, key: usize, code: u16) {
        self.slots[key] = code;
        self.used.push(key);
    }

    fn reset(&mut self) {
        for key in self.used.drain(..) {
            self.slots[key] = 0;
        }
    }
}

/// Compress `indices` into an LZW code stream (without sub-block framing).
///
/// Every index must be below `1 << min_code_size`; callers validate
/// indices against the palette first.
pub fn encode(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    let clear = 1u16 << min_code_size;
    let end = clear + 1;
    let first_free = clear + 2;

    let mut table = CodeTable::new();
    let mut next = first_free;
    let mut width = min_code_size + 1;

    let mut writer = BitWriter::with_capacity(indices.len() / 2 + 16);
    writer.write(clear, width);

    let Some((&first, rest)) = indices.split_first() else {
        writer.write(end, width);
        return writer.finish();
    };

    let mut prefix = first as u16;
    for &k in rest {
        let key = ((prefix as usize) << 8) | k as usize;
        let child = table.get(key);
        if child != 0 {
            prefix = child;
            continue;
        }

        writer.write(prefix, width);
        if (next as usize) < MAX_TABLE_SIZE {
            table.insert(key, next);
            next += 1;
            if next as usize > (1 << width) && width < MAX_CODE_WIDTH {
                width += 1;
            }
        }
        if next as usize == MAX_TABLE_SIZE {
            writer.write(clear, width);
            table.reset();
            next = first_free;
            width = min_code_size + 1;
        }
        prefix = k as u16;
    }

    writer.write(prefix, width);
    writer.write(end, width);
    writer.finish()
}

/// Table statistics gathered while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LzwStats {
    /// Largest number of table entries in use at any point, including the
    /// literal, clear and end codes.
    pub peak_table_size: usize,
    /// Number of clear codes seen, the leading one included.
    pub clear_codes: usize,
}

/// Decompress an LZW code stream (without sub-block framing).
///
/// Decoding stops at the end code, or when the data runs out.
pub fn decode(data: &[u8], min_code_size: u8) -> Result<Vec<u8>, LzwError> {
    decode_with_stats(data, min_code_size).map(|(indices, _)| indices)
}

/// [`decode`], also reporting table usage.
pub fn decode_with_stats(data: &[u8], min_code_size: u8) -> Result<(Vec<u8>, LzwStats), LzwError> {
    if !(2..=8).contains(&min_code_size) {
        return Err(LzwError::InvalidMinCodeSize(min_code_size));
    }
    let clear = 1u16 << min_code_size;
    let end = clear + 1;
    let first_free = clear + 2;

    let mut prefix = [0u16; MAX_TABLE_SIZE];
    let mut suffix = [0u8; MAX_TABLE_SIZE];
    for code in 0..clear {
        suffix[code as usize] = code as u8;
    }

    let mut stats = LzwStats::default();
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut stack: Vec<u8> = Vec::with_capacity(MAX_TABLE_SIZE);

    let mut next = first_free;
    let mut width = min_code_size + 1;
    let mut previous: Option<u16> = None;

    let mut acc = 0u32;
    let mut nbits = 0u8;
    let mut bytes = data.iter();

    loop {
        while nbits < width {
            match bytes.next() {
                Some(&b) => {
                    acc |= (b as u32) << nbits;
                    nbits += 8;
                }
                None => return Ok((out, stats)),
            }
        }
        let code = (acc & ((1 << width) - 1)) as u16;
        acc >>= width;
        nbits -= width;

        if code == clear {
            stats.clear_codes += 1;
            next = first_free;
            width = min_code_size + 1;
            previous = None;
            continue;
        }
        if code == end {
            break;
        }

        let Some(prev) = previous else {
            if code >= clear {
                return Err(LzwError::InvalidFirstCode(code));
            }
            out.push(code as u8);
            previous = Some(code);
            stats.peak_table_size = stats.peak_table_size.max(next as usize);
            continue;
        };

        // Unroll the string for `code` (or for `prev` plus its own first
        // byte when `code` is the entry about to be created).
        stack.clear();
        let mut cursor = if code < next {
            code
        } else if code == next {
            prev
        } else {
            return Err(LzwError::InvalidCode { code, next });
        };
        while cursor >= first_free {
            stack.push(suffix[cursor as usize]);
            cursor = prefix[cursor as usize];
        }
        stack.push(suffix[cursor as usize]);
        let head = cursor as u8;
        out.extend(stack.iter().rev());
        if code == next {
            out.push(head);
        }

        if (next as usize) < MAX_TABLE_SIZE {
            prefix[next as usize] = prev;
            suffix[next as usize] = head;
            next += 1;
            if next as usize == (1 << width) && width < MAX_CODE_WIDTH {
                width += 1;
            }
        }
        stats.peak_table_size = stats.peak_table_size.max(next as usize);
        previous = Some(code);
    }

    Ok((out, stats))
}
