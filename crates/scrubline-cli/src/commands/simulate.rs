use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Result;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use scrubline_core::trigger::{Boundary, CrossDirection, PinTransition};
use scrubline_core::{
    EngineConfig, FrameOutput, InputSource, Scene, ScrollEngine, TriggerEvent, TriggerHandle,
};

/// A wheel delta injected before a given frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub delta: f64,
    pub frame: u64,
}

impl FromStr for WheelInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (delta, frame) = s
            .split_once('@')
            .ok_or_else(|| format!("expected DELTA@FRAME, got '{}'", s))?;
        let delta = delta
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .ok_or_else(|| format!("invalid delta '{}'", delta))?;
        let frame = frame
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("invalid frame '{}'", frame))?;
        Ok(Self { delta, frame })
    }
}

pub struct SimulateArgs {
    pub scene: PathBuf,
    pub frames: u64,
    pub wheel: Vec<WheelInput>,
    pub realtime: bool,
    pub json: bool,
}

pub async fn run(config: &EngineConfig, args: SimulateArgs) -> Result<()> {
    let scene = Scene::load(&args.scene)?;
    let layout = scene.layout();
    let mut engine = ScrollEngine::new(config.clone());
    let names: HashMap<TriggerHandle, String> = scene
        .install(&mut engine)?
        .into_iter()
        .map(|(name, handle)| (handle, name))
        .collect();

    info!(
        scene = %args.scene.display(),
        triggers = names.len(),
        frames = args.frames,
        realtime = args.realtime,
        "Simulating"
    );

    let frame_duration = config.scroll.frame_duration();
    let mut ticker = interval(frame_duration);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    for frame in 0..args.frames {
        for input in args.wheel.iter().filter(|input| input.frame == frame) {
            engine.scroll_by(input.delta, InputSource::Wheel);
        }

        let output = if args.realtime {
            ticker.tick().await;
            engine.frame_at(Instant::now(), &layout)
        } else {
            engine.frame(frame_duration.as_secs_f64(), &layout)
        };

        if args.json {
            println!("{}", frame_json(frame, &output, &names));
        } else {
            print_frame(frame, &output, &names);
        }
    }

    let state = engine.scroll_state();
    if !args.json {
        println!(
            "\nFinal offset {:.2} (target {:.2}) after {} frames",
            state.smoothed,
            state.raw_target,
            engine.frame_count()
        );
    }
    Ok(())
}

fn name(names: &HashMap<TriggerHandle, String>, handle: TriggerHandle) -> String {
    names
        .get(&handle)
        .cloned()
        .unwrap_or_else(|| handle.to_string())
}

fn describe_event(event: &TriggerEvent, names: &HashMap<TriggerHandle, String>) -> String {
    match *event {
        TriggerEvent::Boundary {
            trigger,
            edge,
            direction,
        } => {
            let edge = match edge {
                Boundary::Start => "start",
                Boundary::End => "end",
            };
            let direction = match direction {
                CrossDirection::Forward => "forward",
                CrossDirection::Backward => "backward",
            };
            format!("{} crossed {} {}", name(names, trigger), edge, direction)
        }
        TriggerEvent::Pin {
            trigger,
            transition,
            reserved,
        } => {
            let transition = match transition {
                PinTransition::Pinned => "pinned",
                PinTransition::Released => "released",
                PinTransition::Unpinned => "unpinned",
            };
            format!("{} {} (reserved {})", name(names, trigger), transition, reserved)
        }
    }
}

fn print_frame(frame: u64, output: &FrameOutput, names: &HashMap<TriggerHandle, String>) {
    let Some(scroll) = output.scroll else {
        println!("frame {:>5}  stopped", frame);
        return;
    };
    // settled frames with nothing to apply are not interesting
    if output.is_empty() && scroll.settled {
        return;
    }

    println!(
        "frame {:>5}  offset {:>9.2}  velocity {:>9.1}/s  {:?}",
        frame, scroll.offset, scroll.velocity, scroll.direction
    );
    for event in &output.events {
        println!("  event    {}", describe_event(event, names));
    }
    for update in &output.triggers {
        let pin = update
            .pin_offset
            .map(|offset| format!("  pin offset {:.2}", offset))
            .unwrap_or_default();
        println!(
            "  trigger  {} progress {:.4} playhead {:.4}{}",
            name(names, update.trigger),
            update.progress,
            update.playhead,
            pin
        );
    }
    for property in &output.properties {
        println!(
            "  set      {}.{} = {:.4}",
            property.element, property.property, property.value
        );
    }
}

fn frame_json(
    frame: u64,
    output: &FrameOutput,
    names: &HashMap<TriggerHandle, String>,
) -> serde_json::Value {
    serde_json::json!({
        "frame": frame,
        "offset": output.scroll.map(|s| s.offset),
        "velocity": output.scroll.map(|s| s.velocity),
        "settled": output.scroll.map(|s| s.settled),
        "events": output
            .events
            .iter()
            .map(|e| describe_event(e, names))
            .collect::<Vec<_>>(),
        "triggers": output
            .triggers
            .iter()
            .map(|u| serde_json::json!({
                "trigger": name(names, u.trigger),
                "progress": u.progress,
                "playhead": u.playhead,
                "pin_offset": u.pin_offset,
            }))
            .collect::<Vec<_>>(),
        "properties": output
            .properties
            .iter()
            .map(|p| serde_json::json!({
                "element": p.element.as_str(),
                "property": p.property,
                "value": p.value,
            }))
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wheel_input() {
        assert_eq!(
            "120@3".parse::<WheelInput>().unwrap(),
            WheelInput {
                delta: 120.0,
                frame: 3
            }
        );
        assert_eq!("-40.5@0".parse::<WheelInput>().unwrap().delta, -40.5);
        assert!("120".parse::<WheelInput>().is_err());
        assert!("abc@1".parse::<WheelInput>().is_err());
        assert!("10@-1".parse::<WheelInput>().is_err());
    }
}
