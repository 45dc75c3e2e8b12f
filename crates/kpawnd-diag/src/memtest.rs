//! Memtest86+-style memory tester.
//!
//! Each test takes ten ticks; every tick writes and verifies one tenth of a
//! small scratch buffer with that test's pattern. The scratch buffer is capped
//! so a large declared memory size costs nothing extra.

/// Upper bound on the scratch buffer.
const SCRATCH_CAP: usize = 64 * 1024;

/// Progress added per tick, in percent.
const STEP: u32 = 10;

/// Cells in the progress bar.
const BAR_CELLS: usize = 20;

/// Test names in run order.
pub const TESTS: [&str; 9] = [
    "Address test, own address",
    "Moving inversions, ones & zeros",
    "Moving inversions, 8 bit pattern",
    "Moving inversions, random pattern",
    "Block move, 64 moves",
    "Moving inversions, 32 bit pattern",
    "Random number sequence",
    "Modulo 20, ones & zeros",
    "Bit fade test, 2 patterns",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RunState {
    Running,
    Complete,
    Cancelled,
}

/// A single pass over all tests.
#[derive(Clone, Debug)]
pub struct Memtest {
    memory_mb: u32,
    scratch: Vec<u8>,
    test: usize,
    progress: u32,
    errors: u32,
    state: RunState,
}

impl Memtest {
    pub fn new(memory_mb: u32) -> Self {
        let bytes = (memory_mb as usize)
            .saturating_mul(1024 * 1024)
            .clamp(STEP as usize * 8, SCRATCH_CAP);
        Self {
            memory_mb,
            scratch: vec![0; bytes],
            test: 0,
            progress: 0,
            errors: 0,
            state: RunState::Running,
        }
    }

    /// Banner printed above the progress lines.
    pub fn header(&self) -> String {
        format!(
            "Memtest86+ v5.01\n\nTesting {}MB of memory\n",
            self.memory_mb
        )
    }

    /// Advance one step. Returns `false` once the run is over.
    pub fn tick(&mut self) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        if self.progress >= 100 {
            self.progress = 0;
            self.test += 1;
            if self.test >= TESTS.len() {
                self.state = RunState::Complete;
                return false;
            }
        }
        let chunk = self.scratch.len() / 10;
        let start = chunk * (self.progress / STEP) as usize;
        let end = if self.progress + STEP >= 100 {
            self.scratch.len()
        } else {
            start + chunk
        };
        self.errors += run_pattern(self.test, &mut self.scratch[start..end], start);
        self.progress += STEP;
        true
    }

    /// Stop the run where it is.
    pub fn cancel(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Cancelled;
        }
    }

    /// Line describing the current state.
    pub fn current_line(&self) -> String {
        match self.state {
            RunState::Complete => format!(
                "\n** Pass complete, {} errors, press Esc to exit **",
                self.errors
            ),
            RunState::Cancelled => "\n** Test aborted by user **".to_string(),
            RunState::Running => {
                let filled = (self.progress as usize * BAR_CELLS / 100).min(BAR_CELLS);
                format!(
                    "Test {}: {} [{}{}] {}% (Errors: {})",
                    self.test + 1,
                    TESTS[self.test],
                    "=".repeat(filled),
                    " ".repeat(BAR_CELLS - filled),
                    self.progress,
                    self.errors
                )
            }
        }
    }

    /// Whether the run has finished or been cancelled.
    pub fn is_complete(&self) -> bool {
        self.state != RunState::Running
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == RunState::Cancelled
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Zero-based index of the running test.
    pub fn current_test(&self) -> usize {
        self.test
    }
}

/// Write the test's pattern over `cells` and count cells that read back wrong.
/// `base` is the offset of `cells` in the scratch buffer.
fn run_pattern(test: usize, cells: &mut [u8], base: usize) -> u32 {
    match test {
        0 => write_verify(cells, |i| ((base + i) & 0xff) as u8),
        1 => write_verify(cells, |_| 0xff) + write_verify(cells, |_| 0x00),
        2 => write_verify(cells, |_| 0xaa) + write_verify(cells, |_| 0x55),
        3 => {
            let mut rng = XorShift::new(0x9e37_79b9 ^ base as u32);
            let pattern: Vec<u8> = (0..cells.len()).map(|_| rng.next_byte()).collect();
            write_verify(cells, |i| pattern[i]) + write_verify(cells, |i| !pattern[i])
        }
        4 => block_move(cells),
        5 => {
            let word = |i: usize| 1u32.rotate_left(((base + i) / 4) as u32 % 32).to_le_bytes();
            write_verify(cells, |i| word(i)[(base + i) % 4])
        }
        6 => {
            let mut rng = XorShift::new(0x85eb_ca6b ^ base as u32);
            let pattern: Vec<u8> = (0..cells.len()).map(|_| rng.next_byte()).collect();
            write_verify(cells, |i| pattern[i])
        }
        7 => {
            write_verify(cells, |i| if (base + i) % 20 == 0 { 0xff } else { 0x00 })
                + write_verify(cells, |i| if (base + i) % 20 == 0 { 0x00 } else { 0xff })
        }
        _ => write_verify(cells, |_| 0xaa) + write_verify(cells, |_| 0x55),
    }
}

fn write_verify(cells: &mut [u8], pattern: impl Fn(usize) -> u8) -> u32 {
    for (i, cell) in cells.iter_mut().enumerate() {
        *cell = pattern(i);
    }
    cells
        .iter()
        .enumerate()
        .filter(|(i, cell)| **cell != pattern(*i))
        .count() as u32
}

/// Fill the first half, copy it over the second half and compare.
fn block_move(cells: &mut [u8]) -> u32 {
    let half = cells.len() / 2;
    for (i, cell) in cells[..half].iter_mut().enumerate() {
        *cell = (i % 251) as u8;
    }
    cells.copy_within(..half, half);
    (0..half).filter(|&i| cells[i] != cells[half + i]).count() as u32
}

/// Small deterministic generator for the random-pattern tests.
struct XorShift(u32);

impl XorShift {
    fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    fn next_byte(&mut self) -> u8 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        (x >> 24) as u8
    }
}
