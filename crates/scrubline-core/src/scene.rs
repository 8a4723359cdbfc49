//! Scene documents: a page's geometry, timelines and triggers in one file
//!
//! Scenes are authored in TOML or JSON and let a host (or the CLI) set up an
//! engine without code:
//!
//! ```toml
//! document_height = 5000
//! viewport = { width = 1280, height = 800 }
//!
//! [elements]
//! about = { top = 1200, height = 600 }
//! title = { top = 1250, height = 80 }
//!
//! [timelines.about]
//! initial = { title = { opacity = 0 } }
//! segments = [
//!     { targets = ["title"], duration = 0.3, properties = { opacity = 1 } },
//! ]
//!
//! [[triggers]]
//! name = "about"
//! element = "about"
//! start = "top 80%"
//! end = "center center"
//! timeline = "about"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TriggerConfig;
use crate::engine::ScrollEngine;
use crate::error::CompositionError;
use crate::layout::{ElementBox, ElementRef, StaticLayout, Viewport};
use crate::timeline::{compose, ComposeOptions, InitialValues, SegmentSpec, Timeline};
use crate::trigger::{BoundsSpec, Edge, EndRule, TriggerHandle, TriggerSpec};
use crate::{Error, Result};

/// Authored timeline: initial values plus segments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineDoc {
    #[serde(default)]
    pub initial: InitialValues,
    #[serde(default)]
    pub segments: Vec<SegmentSpec>,
    /// Pull staggered segments back so none ends after this time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_limit: Option<f64>,
}

impl TimelineDoc {
    pub fn compose(&self) -> std::result::Result<Timeline, CompositionError> {
        let options = ComposeOptions {
            duration_limit: self.duration_limit,
        };
        compose(&self.segments, &self.initial, &options)
    }
}

/// `scrub = true` uses the configured lag, a number sets it in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scrub {
    Enabled(bool),
    Seconds(f64),
}

impl Default for Scrub {
    fn default() -> Self {
        Scrub::Enabled(false)
    }
}

impl Scrub {
    pub fn seconds(&self, config: &TriggerConfig) -> Option<f64> {
        match *self {
            Scrub::Enabled(false) => None,
            Scrub::Enabled(true) => Some(config.scrub_secs()),
            Scrub::Seconds(secs) if secs > 0.0 => Some(secs),
            Scrub::Seconds(_) => None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Authored trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDoc {
    pub name: String,
    pub element: ElementRef,
    pub start: Edge,
    pub end: EndRule,
    #[serde(default)]
    pub pin: bool,
    #[serde(default = "default_true")]
    pub pin_spacing: bool,
    #[serde(default)]
    pub scrub: Scrub,
    /// Name of the timeline it scrubs; progress only when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
}

impl TriggerDoc {
    pub fn spec(&self, config: &TriggerConfig) -> TriggerSpec {
        TriggerSpec {
            bounds: BoundsSpec::new(self.element.clone(), self.start, self.end.clone()),
            pin: self.pin,
            pin_spacing: self.pin_spacing,
            scrub: self.scrub.seconds(config),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub viewport: Viewport,
    pub document_height: f64,
    #[serde(default)]
    pub elements: BTreeMap<ElementRef, ElementBox>,
    #[serde(default)]
    pub timelines: BTreeMap<String, TimelineDoc>,
    /// Registered in this order
    #[serde(default)]
    pub triggers: Vec<TriggerDoc>,
}

impl Scene {
    /// Load a scene, choosing the format by file extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => Err(Error::Config(format!(
                "Unsupported scene format: {}",
                path.display()
            ))),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Geometry of the scene as a layout capability
    pub fn layout(&self) -> StaticLayout {
        let mut layout = StaticLayout::new(self.viewport, self.document_height);
        for (element, bounds) in &self.elements {
            layout.set_element(element.clone(), *bounds);
        }
        layout
    }

    pub fn timeline(&self, name: &str) -> Result<Timeline> {
        let doc = self
            .timelines
            .get(name)
            .ok_or_else(|| Error::Other(format!("Unknown timeline '{}'", name)))?;
        Ok(doc.compose()?)
    }

    /// Compose every timeline, keeping failures instead of stopping at the first
    pub fn compose_all(&self) -> Vec<(&str, std::result::Result<Timeline, CompositionError>)> {
        self.timelines
            .iter()
            .map(|(name, doc)| (name.as_str(), doc.compose()))
            .collect()
    }

    /// References that do not resolve within the scene
    pub fn dangling_references(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for trigger in &self.triggers {
            if !self.elements.contains_key(&trigger.element) {
                problems.push(format!(
                    "trigger '{}' measures unknown element '{}'",
                    trigger.name, trigger.element
                ));
            }
            if let EndRule::HorizontalTrack { track, .. } = &trigger.end {
                if !self.elements.contains_key(track) {
                    problems.push(format!(
                        "trigger '{}' tracks unknown element '{}'",
                        trigger.name, track
                    ));
                }
            }
            if let Some(timeline) = &trigger.timeline {
                if !self.timelines.contains_key(timeline) {
                    problems.push(format!(
                        "trigger '{}' scrubs unknown timeline '{}'",
                        trigger.name, timeline
                    ));
                }
            }
        }
        for (name, doc) in &self.timelines {
            let unknown: BTreeSet<&ElementRef> = doc
                .initial
                .keys()
                .chain(doc.segments.iter().flat_map(|spec| spec.targets.iter()))
                .filter(|element| !self.elements.contains_key(*element))
                .collect();
            for element in unknown {
                problems.push(format!(
                    "timeline '{}' animates unknown element '{}'",
                    name, element
                ));
            }
        }
        problems
    }

    /// Register every trigger on `engine`, in document order
    ///
    /// Timelines are composed first; any composition error or unknown
    /// timeline aborts before anything is registered.
    pub fn install(&self, engine: &mut ScrollEngine) -> Result<Vec<(String, TriggerHandle)>> {
        let mut prepared = Vec::with_capacity(self.triggers.len());
        for trigger in &self.triggers {
            let timeline = match &trigger.timeline {
                Some(name) => Some(self.timeline(name)?),
                None => None,
            };
            if !self.elements.contains_key(&trigger.element) {
                warn!(trigger = %trigger.name, element = %trigger.element, "Trigger element not in scene");
            }
            prepared.push((trigger, timeline));
        }

        let config = engine.config().trigger.clone();
        let handles: Vec<(String, TriggerHandle)> = prepared
            .into_iter()
            .map(|(trigger, timeline)| {
                let handle = engine.register_trigger(trigger.spec(&config), timeline);
                (trigger.name.clone(), handle)
            })
            .collect();

        info!(triggers = handles.len(), timelines = self.timelines.len(), "Scene installed");
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::JumpOptions;
    use std::io::Write;
    use tempfile::TempDir;

    const SCENE: &str = r#"
        document_height = 5000
        viewport = { width = 1280, height = 800 }

        [elements]
        hero = { top = 0, height = 800 }
        about = { top = 1200, height = 600 }
        title = { top = 1250, height = 80 }
        track = { top = 2000, height = 800, scroll_width = 3280 }

        [timelines.about]
        initial = { title = { opacity = 0 } }
        segments = [
            { targets = ["title"], duration = 0.3, ease = "linear", properties = { opacity = 1 } },
            { duration = 0.2 },
            { targets = ["title"], duration = 0.5, position = "<", ease = "none", properties = { y = { from = 40, to = 0 } } },
        ]

        [[triggers]]
        name = "progress"
        element = "hero"
        start = "top top"
        end = "bottom top"

        [[triggers]]
        name = "about"
        element = "about"
        start = "top bottom"
        end = "bottom top"
        timeline = "about"
        scrub = true

        [[triggers]]
        name = "portfolio"
        element = "track"
        start = "top top"
        end = { track = "track", margin = 0 }
        pin = true
    "#;

    fn write_scene(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_toml_scene() {
        let dir = TempDir::new().unwrap();
        let path = write_scene(&dir, "landing.toml", SCENE);
        let scene = Scene::load(&path).unwrap();

        assert_eq!(scene.triggers.len(), 3);
        assert_eq!(scene.triggers[1].scrub, Scrub::Enabled(true));
        assert!(scene.triggers[2].pin);
        assert_eq!(scene.elements.len(), 4);
        assert!(scene.dangling_references().is_empty());
    }

    #[test]
    fn test_load_json_scene() {
        let dir = TempDir::new().unwrap();
        let path = write_scene(
            &dir,
            "mini.json",
            r#"{
                "viewport": { "width": 1280, "height": 800 },
                "document_height": 2000,
                "elements": { "box": { "top": 500, "height": 100 } },
                "timelines": {
                    "fade": { "segments": [
                        { "targets": ["box"], "duration": 1, "properties": { "opacity": { "from": 0, "to": 1 } } }
                    ] }
                },
                "triggers": [
                    { "name": "box", "element": "box", "start": "top 80%", "end": "+=300", "scrub": 0.25, "timeline": "fade" }
                ]
            }"#,
        );
        let scene = Scene::load(&path).unwrap();
        let spec = scene.triggers[0].spec(&TriggerConfig::default());
        assert_eq!(spec.scrub, Some(0.25));
        assert!(scene.timeline("fade").is_ok());
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_scene(&dir, "scene.yaml", "viewport: {}");
        assert!(matches!(Scene::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_compose_scene_timeline() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        let timeline = scene.timeline("about").unwrap();
        let segments = timeline.segments();
        assert_eq!(segments.len(), 3);
        // "<" after the hold starts with the hold
        assert!((segments[2].start - 0.3).abs() < 1e-12);
        assert!((timeline.total_duration() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_install_and_drive() {
        let scene = Scene::from_toml_str(SCENE).unwrap();
        let layout = scene.layout();
        let mut engine = ScrollEngine::default();
        let handles = scene.install(&mut engine).unwrap();
        assert_eq!(
            handles.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
            vec!["progress", "about", "portfolio"]
        );

        engine.frame(1.0 / 60.0, &layout);
        let portfolio = engine.triggers().get(handles[2].1).unwrap();
        // 3280 wide track in a 1280 viewport, no margin
        assert_eq!(portfolio.bounds().unwrap().distance(), 2000.0);

        engine
            .jump_to("about", JumpOptions::immediate(), &layout)
            .unwrap();
        for _ in 0..300 {
            engine.frame(1.0 / 60.0, &layout);
        }
        let about = engine.triggers().get(handles[1].1).unwrap();
        assert!((about.progress() - 800.0 / 1400.0).abs() < 1e-9);
        assert!((about.playhead() - about.progress()).abs() < 1e-6);
    }

    #[test]
    fn test_install_reports_composition_errors() {
        let broken = SCENE.replace("duration = 0.3", "duration = 0.0");
        let scene = Scene::from_toml_str(&broken).unwrap();
        let mut engine = ScrollEngine::default();
        let err = scene.install(&mut engine).unwrap_err();
        assert!(matches!(
            err,
            Error::Composition(CompositionError::ZeroLengthChange { segment: 0 })
        ));
        assert!(engine.triggers().is_empty());

        let results = scene.compose_all();
        assert_eq!(results.len(), 1);
        assert!(results[0].1.is_err());
    }

    #[test]
    fn test_dangling_references() {
        let scene = Scene::from_toml_str(&SCENE.replace("timeline = \"about\"", "timeline = \"missing\""))
            .unwrap();
        let problems = scene.dangling_references();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("missing"));
        assert!(scene.install(&mut ScrollEngine::default()).is_err());
    }

    #[test]
    fn test_dangling_timeline_targets() {
        let scene = Scene::from_toml_str(
            &SCENE
                .replace("initial = { title = ", "initial = { ghost_init = ")
                .replace("targets = [\"title\"], duration = 0.3", "targets = [\"ghost\"], duration = 0.3"),
        )
        .unwrap();
        let problems = scene.dangling_references();
        assert_eq!(problems.len(), 2);
        assert!(problems
            .iter()
            .any(|p| p.contains("timeline 'about'") && p.contains("'ghost'")));
        assert!(problems.iter().any(|p| p.contains("'ghost_init'")));

        let clean = Scene::from_toml_str(SCENE).unwrap();
        assert!(clean.dangling_references().is_empty());
    }
}
