//! Code-128 decoding along raster rows.
//!
//! A row is reduced to alternating ink/paper runs. Every symbol is six runs
//! wide and eleven modules long, so each group of six runs is normalised by
//! its own module width before the table lookup. The check symbol must
//! match before any text is returned.

use crate::raster::Bitmap;

/// Bar/space widths in modules of symbol values 0..=105.
pub(crate) const PATTERNS: [[u8; 6]; 106] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2], [1, 3, 1, 2, 2, 2], [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3], [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1], [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1], [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2], [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1], [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3], [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1], [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1], [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1], [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1], [3, 1, 1, 1, 2, 3], [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2], [1, 2, 1, 1, 2, 4], [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4], [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1], [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1], [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2], [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1], [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1], [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1], [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4], [2, 1, 1, 2, 3, 2],
];

pub(crate) const STOP: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

const START_A: usize = 103;
const START_B: usize = 104;
pub(crate) const START_C: usize = 105;

/// Longest symbol sequence accepted before giving up on a row.
const MAX_SYMBOLS: usize = 64;

/// Rows sampled across the raster height.
const SCAN_ROWS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// One run of equal pixels: ink flag and length.
type Run = (bool, u32);

/// Decode the first readable Code-128 symbol in `bitmap`, read left to
/// right or, for a page fed upside down, right to left.
pub fn decode(bitmap: &Bitmap) -> Option<String> {
    let (w, h) = bitmap.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let rows = SCAN_ROWS.min(h);
    for i in 0..rows {
        let y = ((2 * u64::from(i) + 1) * u64::from(h) / (2 * u64::from(rows))) as u32;
        let runs = row_runs(bitmap, y);
        if let Some(text) = decode_runs(&runs) {
            return Some(text);
        }
        let reversed: Vec<Run> = runs.iter().rev().copied().collect();
        if let Some(text) = decode_runs(&reversed) {
            return Some(text);
        }
    }
    tracing::trace!("no code128 symbol in {}x{} raster", w, h);
    None
}

fn row_runs(bitmap: &Bitmap, y: u32) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for x in 0..bitmap.width() {
        let ink = bitmap.is_ink(i64::from(x), i64::from(y));
        match runs.last_mut() {
            Some((last, len)) if *last == ink => *len += 1,
            _ => runs.push((ink, 1)),
        }
    }
    runs
}

/// Module widths of `runs`, normalised to `modules` in total.
fn widths<const N: usize>(runs: &[Run], modules: f64) -> Option<[u8; N]> {
    if runs.len() < N || !runs[0].0 {
        return None;
    }
    let total: u32 = runs[..N].iter().map(|r| r.1).sum();
    if total == 0 {
        return None;
    }
    let module = f64::from(total) / modules;
    let mut out = [0u8; N];
    for (w, run) in out.iter_mut().zip(runs) {
        *w = (f64::from(run.1) / module).round().clamp(1.0, 4.0) as u8;
    }
    Some(out)
}

fn symbol_at(runs: &[Run]) -> Option<usize> {
    let w = widths::<6>(runs, 11.0)?;
    PATTERNS.iter().position(|p| *p == w)
}

fn stop_at(runs: &[Run]) -> bool {
    widths::<7>(runs, 13.0) == Some(STOP)
}

fn decode_runs(runs: &[Run]) -> Option<String> {
    (0..runs.len())
        .filter(|&i| matches!(symbol_at(&runs[i..]), Some(START_A..=START_C)))
        .find_map(|i| decode_from(&runs[i..]))
}

/// Decode a symbol sequence that starts with a start code at `runs[0]`.
fn decode_from(runs: &[Run]) -> Option<String> {
    let mut values = Vec::new();
    let mut pos = 0;
    loop {
        let rest = runs.get(pos..)?;
        if let Some(v) = symbol_at(rest) {
            values.push(v);
            pos += 6;
        } else if stop_at(rest) {
            break;
        } else {
            return None;
        }
        if values.len() > MAX_SYMBOLS {
            return None;
        }
    }

    let (&start, rest) = values.split_first()?;
    let (&check, data) = rest.split_last()?;
    let sum = data
        .iter()
        .enumerate()
        .fold(start, |acc, (i, &v)| acc + (i + 1) * v);
    if sum % 103 != check {
        tracing::trace!("code128 check symbol {} does not match {}", check, sum % 103);
        return None;
    }
    text(start, data)
}

fn text(start: usize, data: &[usize]) -> Option<String> {
    let mut set = match start {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        _ => CodeSet::C,
    };
    let mut shifted = false;
    let mut out = String::new();
    for &v in data {
        let current = match (shifted, set) {
            (true, CodeSet::A) => CodeSet::B,
            (true, CodeSet::B) => CodeSet::A,
            _ => set,
        };
        shifted = false;
        if current == CodeSet::C {
            match v {
                0..=99 => out.push_str(&format!("{:02}", v)),
                100 => set = CodeSet::B,
                101 => set = CodeSet::A,
                102 => {}
                _ => return None,
            }
            continue;
        }
        match v {
            0..=95 => out.push(char_in(current, v)),
            // FNC3, FNC2, FNC1 carry no text.
            96 | 97 | 102 => {}
            98 => shifted = true,
            99 => set = CodeSet::C,
            100 if current == CodeSet::A => set = CodeSet::B,
            101 if current == CodeSet::B => set = CodeSet::A,
            // FNC4
            100 | 101 => {}
            _ => return None,
        }
    }
    Some(out)
}

fn char_in(set: CodeSet, v: usize) -> char {
    let byte = match set {
        CodeSet::A if v >= 64 => v - 64,
        _ => v + 32,
    };
    char::from(byte as u8)
}
