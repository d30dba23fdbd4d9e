use dw_core::level::{SaveFormat, WorldSnapshot};
use dw_core::motd::MotdTable;

pub const RED: &str = "\x1b[31m";
pub const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[90m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const ESC: &str = "\x1b";
const BELL: &str = "\x07";

const SEPARATOR: &str = "==============================";

/// Formats and prints the console announcement for a day change.
///
/// Rendering is split from printing so tests can assert on the produced
/// lines without capturing stdout.
pub struct Announcer {
    mute: bool,
    motds: Option<MotdTable>,
    template: Option<String>,
    fresh_only: bool,
}

impl Announcer {
    pub fn new(
        mute: bool,
        motds: Option<MotdTable>,
        template: Option<String>,
        fresh_only: bool,
    ) -> Self {
        Self {
            mute,
            motds,
            template,
            fresh_only,
        }
    }

    /// Print the announcement for a newly observed day.
    pub fn announce(&self, snapshot: &WorldSnapshot, format: SaveFormat) {
        for line in self.render(snapshot, format) {
            println!("{line}");
        }
    }

    /// Render the announcement lines: separator, headline, and an optional
    /// scheduled message.
    pub fn render(&self, snapshot: &WorldSnapshot, format: SaveFormat) -> Vec<String> {
        let mut lines = Vec::with_capacity(3);
        lines.push(format!("{DIM}{SEPARATOR}{RESET}"));

        let day_text = match format {
            SaveFormat::Modern => format!("Day {}", snapshot.day),
            SaveFormat::Indev => {
                let unit = if snapshot.day == 1 { "day" } else { "days" };
                format!("{} {unit} counted", snapshot.day)
            }
        };
        let bell = if self.mute { "" } else { BELL };
        lines.push(format!(
            "{YELLOW}{}{DIM} - {CYAN}{day_text}{RESET}{bell}",
            snapshot.world_name
        ));

        if let Some(motd) = self.scheduled_message(snapshot.day) {
            lines.push(motd);
        }
        lines
    }

    fn scheduled_message(&self, day: i64) -> Option<String> {
        let motd = self.motds.as_ref()?.lookup(day, self.fresh_only)?;
        match &self.template {
            Some(template) => Some(format!(
                "{}{RESET}",
                template.replace("%ESC%", ESC).replace("%MOTD%", motd)
            )),
            None => Some(motd.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn snapshot(day: i64) -> WorldSnapshot {
        WorldSnapshot {
            world_name: "Hollow".into(),
            day,
            observed_at: Utc::now(),
        }
    }

    fn plain_announcer(motds: Option<MotdTable>) -> Announcer {
        Announcer::new(true, motds, None, false)
    }

    #[test]
    fn modern_headline_uses_day_phrasing() {
        let lines = plain_announcer(None).render(&snapshot(4), SaveFormat::Modern);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("Day 4"));
        assert!(lines[1].contains("Hollow"));
    }

    #[test]
    fn indev_headline_pluralises() {
        let announcer = plain_announcer(None);
        let one = announcer.render(&snapshot(1), SaveFormat::Indev);
        let two = announcer.render(&snapshot(2), SaveFormat::Indev);
        assert!(one[1].contains("1 day counted"));
        assert!(two[1].contains("2 days counted"));
    }

    #[test]
    fn bell_follows_mute_flag() {
        let loud = Announcer::new(false, None, None, false);
        let quiet = Announcer::new(true, None, None, false);
        assert!(loud.render(&snapshot(0), SaveFormat::Modern)[1].contains('\x07'));
        assert!(!quiet.render(&snapshot(0), SaveFormat::Modern)[1].contains('\x07'));
    }

    #[test]
    fn scheduled_message_line_when_one_applies() {
        let motds = MotdTable::parse("1,mine some ore\n");
        let lines = plain_announcer(Some(motds)).render(&snapshot(3), SaveFormat::Modern);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "mine some ore");
    }

    #[test]
    fn no_message_line_without_a_match() {
        let motds = MotdTable::parse("5,later\n");
        let announcer = Announcer::new(true, Some(motds), None, true);
        let lines = announcer.render(&snapshot(3), SaveFormat::Modern);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn template_substitutes_tokens_and_resets() {
        let motds = MotdTable::parse("0,hello\n");
        let announcer = Announcer::new(
            true,
            Some(motds),
            Some("%ESC%[35m>> %MOTD% <<".into()),
            false,
        );
        let lines = announcer.render(&snapshot(0), SaveFormat::Modern);
        assert_eq!(lines[2], "\x1b[35m>> hello <<\x1b[0m");
    }
}
