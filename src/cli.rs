use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{env, fs};

use crate::config::{ConfigState, Profile};
use crate::driver::Session;
use crate::gestures::{EventKind, GestureEvent, Payload};
use crate::trace;
use crate::watch::{self, WatchOptions};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.subcommand()?;

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.opt_free_from_str()?;
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("replay") => {
            let profile_name: Option<String> = pargs.opt_value_from_str("--profile")?;
            let json = pargs.contains("--json");
            let path: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl replay <trace.jsonl> [--profile NAME] [--json]"))?;

            let profile = resolve_profile(profile_name.as_deref())?;
            let text = fs::read_to_string(&path)
                .map_err(|e| anyhow!("failed to read {path}: {e}"))?;
            let steps = trace::parse(&text).map_err(|e| anyhow!("{path}: {e}"))?;

            let mut session = Session::new(profile.classifier_config());
            for r in trace::replay(&mut session, &steps) {
                if json {
                    let line = serde_json::json!({
                        "t_ms": r.at.as_millis() as u64,
                        "event": r.event,
                    });
                    println!("{line}");
                } else {
                    println!("{:>6} ms  {}", r.at.as_millis(), describe(&r.event));
                }
            }
            Ok(())
        }

        Some("watch") => {
            let profile_name: Option<String> = pargs.opt_value_from_str("--profile")?;
            let device: Option<String> = pargs.opt_value_from_str("--device")?;
            let json = pargs.contains("--json");
            let profile = resolve_profile(profile_name.as_deref())?;
            watch::run_watch(profile.classifier_config(), &WatchOptions { device, json })
        }

        Some("show") => {
            let profile_name: Option<String> = pargs.opt_value_from_str("--profile")?;
            let profile = resolve_profile(profile_name.as_deref())?;
            print_json(&serde_json::to_value(&profile)?);
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gesturectl use <profile_name>"))?;
            let mut st = ConfigState::load_or_install_default()?;
            st.set_active(&name)?;
            println!("ok: active profile is now '{}'", st.active_name);
            Ok(())
        }

        Some("list") => {
            let st = ConfigState::load_or_install_default()?;
            for name in st.list_profiles() {
                let mark = if name == st.active_name { '*' } else { ' ' };
                println!("{mark} {name}");
            }
            Ok(())
        }

        Some("doctor") => {
            let st = ConfigState::load_or_install_default()?;
            print_json(&st.doctor_report());
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn resolve_profile(name: Option<&str>) -> Result<Profile> {
    let st = ConfigState::load_or_install_default()?;
    match name {
        Some(n) => st.profile_named(n),
        None => Ok(st.profile),
    }
}

/// One-line human rendering of a notification.
pub fn describe(ev: &GestureEvent) -> String {
    let kind = match ev.kind {
        EventKind::Begin => "begin ",
        EventKind::Update => "update",
        EventKind::End => "end   ",
    };
    let payload = match ev.payload {
        Payload::Hypotheses(set) => set.to_string(),
        Payload::Magnitude(m) => format!("{m:+.1}"),
    };
    format!(
        "{kind} @ ({:.1}, {:.1})  {payload}",
        ev.position.x, ev.position.y
    )
}

fn print_help() {
    println!(
        r#"gesturectl — multi-touch gesture classifier

USAGE:
  gesturectl help [command]                       Show general or command-specific help
  gesturectl replay <trace.jsonl> [--json]        Classify a recorded touch trace
  gesturectl watch [--device PATH] [--json]       Classify live touches from evdev
  gesturectl show                                 Print the effective profile
  gesturectl use <name>                           Switch active profile
  gesturectl list                                 List profiles
  gesturectl doctor                               Diagnose permissions/devices

  replay, watch and show accept --profile NAME to override the active profile.

TIPS:
  - Profiles: ~/.config/gesturectl/profiles
  - Active profile pointer: ~/.config/gesturectl/active
  - Verbose classifier output: RUST_LOG=gesturectl=debug
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "replay" => println!(
            "usage: gesturectl replay <trace.jsonl> [--profile NAME] [--json]\n\
             Each line: {{\"t\": ms, \"op\": \"begin|move|end|timeout\", \"id\": n, \"x\": f, \"y\": f}}.\n\
             The inactivity timeout fires from trace time, as it would live."
        ),
        "watch" => println!(
            "usage: gesturectl watch [--device PATH] [--profile NAME] [--json]\n\
             Reads every multitouch device (or PATH) without grabbing it and prints gestures."
        ),
        "show" => println!("usage: gesturectl show [--profile NAME]\nPrints the profile as JSON."),
        "use" => {
            println!("usage: gesturectl use <name>\nSwitches the active profile to <name>.")
        }
        "list" => {
            println!("usage: gesturectl list\nLists available profiles; marks active with '*'.")
        }
        "doctor" => println!(
            "usage: gesturectl doctor\nChecks permissions and lists detected multitouch devices."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_json(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::hypothesis::{Hypothesis, HypothesisSet};

    #[test]
    fn describe_formats_payloads() {
        let ev = GestureEvent {
            kind: EventKind::Update,
            position: Point::new(50.0, 0.0),
            payload: Payload::Magnitude(80.0),
        };
        assert_eq!(describe(&ev), "update @ (50.0, 0.0)  +80.0");

        let ev = GestureEvent {
            kind: EventKind::Begin,
            position: Point::new(1.0, 2.0),
            payload: Payload::Hypotheses(HypothesisSet::from_bits(
                Hypothesis::SecondButton.bit(),
            )),
        };
        assert_eq!(describe(&ev), "begin  @ (1.0, 2.0)  second_button");
    }
}
