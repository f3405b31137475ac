use laptimer_core::lap_info::{Millis, TimingRecord};

// MM:SS.CC, minutes keep counting past 99
pub fn format_lap_time(ms: Millis) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;
    format!("{:02}:{:02}.{:02}", minutes, seconds, centis)
}

// One status line, the way the overlay lays it out top to bottom
pub fn render(record: &TimingRecord) -> String {
    let mut parts = vec![format_lap_time(record.current_time)];

    if !record.is_on_track {
        parts.push(String::from("OFF TRACK - Timer Reset!"));
    }
    if let Some(best) = record.best_time {
        parts.push(format!("Best: {}", format_lap_time(best)));
    }
    parts.push(format!("Lap {}", record.lap_count));
    if let Some(next) = &record.next_checkpoint {
        parts.push(format!("Next: {}", next));
    }
    if let Some(progress) = &record.checkpoint_progress {
        parts.push(progress.clone());
    }

    parts.join(" | ")
}
