//! X11 screen and window listing via `xrandr` and `wmctrl`

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::application::ports::EnumerationError;
use crate::domain::devices::{Geometry, ScreenSource, SourceRef};

/// List monitors of `display` through `xrandr --listmonitors`
pub async fn list_monitors(display: &str) -> Result<Vec<ScreenSource>, EnumerationError> {
    let output = Command::new("xrandr")
        .arg("--listmonitors")
        .env("DISPLAY", display)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EnumerationError::QueryFailed("xrandr not found".to_string())
            } else {
                EnumerationError::QueryFailed(e.to_string())
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EnumerationError::NoDisplay(format!(
            "{}: {}",
            display,
            stderr.trim()
        )));
    }

    Ok(parse_monitors(&String::from_utf8_lossy(&output.stdout)))
}

/// List top-level windows through `wmctrl -lG`.
///
/// A missing `wmctrl` yields no windows rather than an error.
pub async fn list_windows(display: &str) -> Vec<ScreenSource> {
    let output = Command::new("wmctrl")
        .arg("-lG")
        .env("DISPLAY", display)
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            parse_windows(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            debug!(status = %output.status, "wmctrl failed, listing no windows");
            Vec::new()
        }
        Err(e) => {
            debug!(error = %e, "wmctrl unavailable, listing no windows");
            Vec::new()
        }
    }
}

/// Parse `xrandr --listmonitors` output.
///
/// ```text
/// Monitors: 2
///  0: +*eDP-1 1920/344x1080/193+0+0  eDP-1
///  1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1
/// ```
pub fn parse_monitors(output: &str) -> Vec<ScreenSource> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let index = fields.next()?.strip_suffix(':')?.parse::<u32>().ok()?;
            let name = fields.next()?.trim_start_matches(['+', '*']).to_string();
            let geometry = fields.next().and_then(parse_monitor_geometry);

            Some(ScreenSource {
                id: SourceRef::Screen(index).to_string(),
                name,
                geometry,
            })
        })
        .collect()
}

/// `1920/344x1080/193+0+0` -> 1920x1080 at (0, 0)
fn parse_monitor_geometry(field: &str) -> Option<Geometry> {
    let mut parts = field.split('+');
    let size = parts.next()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;

    let (width, height) = size.split_once('x')?;
    let width = width.split('/').next()?.parse().ok()?;
    let height = height.split('/').next()?.parse().ok()?;

    Some(Geometry {
        x,
        y,
        width,
        height,
    })
}

/// Parse `wmctrl -lG` output.
///
/// Columns: id, desktop, x, y, width, height, host, title. Sticky windows
/// (desktop `-1`) are panels and docks and are skipped.
pub fn parse_windows(output: &str) -> Vec<ScreenSource> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 7 {
                return None;
            }

            let desktop: i32 = fields[1].parse().ok()?;
            if desktop < 0 {
                return None;
            }

            let geometry = Geometry {
                x: fields[2].parse().ok()?,
                y: fields[3].parse().ok()?,
                width: fields[4].parse().ok()?,
                height: fields[5].parse().ok()?,
            };

            let title = fields[7..].join(" ");
            Some(ScreenSource {
                id: SourceRef::Window(fields[0].to_string()).to_string(),
                name: if title.is_empty() {
                    fields[0].to_string()
                } else {
                    title
                },
                geometry: Some(geometry),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITORS: &str = "Monitors: 2\n \
        0: +*eDP-1 1920/344x1080/193+0+0  eDP-1\n \
        1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1\n";

    const WINDOWS: &str = "\
0x02200003 -1 0    0    1920 32   host xfce4-panel
0x03a00003  0 10   42   1280 720  host Terminal - vim
0x04000007  1 1920 0    2560 1440 host Firefox
";

    #[test]
    fn parses_monitor_ids_and_names() {
        let screens = parse_monitors(MONITORS);
        assert_eq!(screens.len(), 2);
        assert_eq!(screens[0].id, "screen:0:0");
        assert_eq!(screens[0].name, "eDP-1");
        assert_eq!(screens[1].id, "screen:1:0");
        assert_eq!(screens[1].name, "HDMI-1");
    }

    #[test]
    fn parses_monitor_geometry() {
        let screens = parse_monitors(MONITORS);
        assert_eq!(
            screens[1].geometry,
            Some(Geometry {
                x: 1920,
                y: 0,
                width: 2560,
                height: 1440
            })
        );
    }

    #[test]
    fn ignores_header_and_garbage() {
        assert!(parse_monitors("Monitors: 0\n").is_empty());
        assert!(parse_monitors("something else entirely").is_empty());
    }

    #[test]
    fn parses_windows_and_skips_sticky() {
        let windows = parse_windows(WINDOWS);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].id, "window:0x03a00003:0");
        assert_eq!(windows[0].name, "Terminal - vim");
        assert_eq!(windows[1].name, "Firefox");
        assert_eq!(windows[1].geometry.map(|g| g.width), Some(2560));
    }

    #[test]
    fn untitled_window_uses_id() {
        let windows = parse_windows("0x01 0 0 0 100 100 host\n");
        assert_eq!(windows[0].name, "0x01");
    }
}
