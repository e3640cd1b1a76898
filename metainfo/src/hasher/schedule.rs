//! Derives a worker count and per-worker read-buffer size from the shape of
//! the file set being hashed. Pure function of its inputs so it is testable
//! without spinning up any threads.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub workers: usize,
    pub buffer_size: usize,
}

const MIB: u64 = 1024 * 1024;

/// `pinned_workers`, when given, overrides the derived worker count (still
/// clamped to at least one and at most `piece_count`).
pub fn derive(total: u64, file_count: usize, piece_count: usize, cpu_count: usize, pinned_workers: Option<usize>) -> Schedule {
    let piece_count = piece_count.max(1);
    let cpu_count = cpu_count.max(1);
    let is_single_file = file_count <= 1;

    let (tiered_workers, buffer_size) = if is_single_file {
        if total < MIB {
            (1, 64 * 1024)
        } else if total < 1024 * MIB {
            (cpu_count, 4 * 1024 * 1024)
        } else {
            (2 * cpu_count, 8 * 1024 * 1024)
        }
    } else {
        let avg = if file_count == 0 { 0 } else { total / file_count as u64 };
        if avg < MIB {
            (cpu_count, 256 * 1024)
        } else if avg < 10 * MIB {
            (cpu_count, 1024 * 1024)
        } else if avg < 1024 * MIB {
            (2 * cpu_count, 4 * 1024 * 1024)
        } else {
            (2 * cpu_count, 8 * 1024 * 1024)
        }
    };

    let workers = pinned_workers.unwrap_or(tiered_workers).max(1).min(piece_count);

    Schedule { workers, buffer_size }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_single_file_runs_on_one_worker() {
        let schedule = derive(1024, 1, 1, 8, None);
        assert_eq!(schedule.workers, 1);
    }

    #[test]
    fn large_single_file_scales_past_cpu_count() {
        let schedule = derive(8 * 1024 * MIB, 1, 512, 8, None);
        assert_eq!(schedule.workers, 16);
    }

    #[test]
    fn pinned_workers_overrides_the_tier_but_not_the_piece_count_floor() {
        let schedule = derive(8 * 1024 * MIB, 1, 3, 8, Some(16));
        assert_eq!(schedule.workers, 3);
    }

    #[test]
    fn multi_file_small_set_runs_on_one_worker() {
        let schedule = derive(1024, 50, 1, 8, None);
        assert_eq!(schedule.workers, 1);
    }

    #[test]
    fn buffer_size_grows_with_total_size() {
        let small = derive(1024, 1, 1, 4, None);
        let large = derive(4096 * 1024 * 1024, 1, 4096, 4, None);
        assert!(large.buffer_size > small.buffer_size);
    }
}
