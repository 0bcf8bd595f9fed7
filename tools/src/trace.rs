//! Recorded native event traces and their replay against the in-memory host.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use textinput_core::platform::set_environment;
use textinput_core::{
    BeforeInputEvent, CompositionSignal, Config, DataTransfer, Delta, DocumentMutation,
    Environment, InputController, InputType, LifecycleEvent, MemoryEditor, NodeRef, Platform,
    Range, Source, TextChange,
};

/// A recorded editing session.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Trace {
    /// Initial document text
    pub text: String,
    pub selection: Option<Range>,
    /// Pins the platform flags; overrides the config file
    pub platform: Option<Platform>,
    /// Host environment used for detection when no platform is pinned
    pub environment: Option<Environment>,
    pub steps: Vec<Step>,
}

/// One native event delivered to the surface.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    CompositionStart {
        #[serde(default)]
        target: Option<NodeRef>,
        #[serde(default)]
        data: String,
    },
    CompositionUpdate {
        #[serde(default)]
        target: Option<NodeRef>,
        #[serde(default)]
        data: String,
    },
    CompositionEnd {
        #[serde(default)]
        target: Option<NodeRef>,
        #[serde(default)]
        data: String,
    },
    RunMicrotasks,
    BeforeInput {
        input_type: InputType,
        #[serde(default)]
        data: Option<String>,
        /// `text/plain` entry of the event's dataTransfer
        #[serde(default)]
        plain_text: Option<String>,
        /// Character offsets inside the text node; omitted for no target range
        #[serde(default)]
        range: Option<(usize, usize)>,
    },
    /// Programmatic insertion followed by the text-change notification
    ApiInsert { index: usize, text: String },
    Select { index: usize, length: usize },
}

/// Outcome of one replayed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: usize,
    pub outcome: String,
    pub composing: bool,
}

/// Document state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub platform: Platform,
    pub text: String,
    pub selection: Option<Range>,
    pub composing: bool,
    pub outcomes: Vec<StepOutcome>,
    pub events: Vec<LifecycleEvent>,
    pub changes: Vec<TextChange>,
}

impl Trace {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Replay `trace` and collect the resulting document state.
pub fn replay(trace: &Trace, config: &Config) -> Result<Report> {
    let mut config = config.clone();
    if let Some(platform) = trace.platform {
        config.set_platform(platform);
    }
    if let Some(env) = &trace.environment {
        set_environment(env.clone());
    }

    let mut controller = InputController::new(&config);
    let mut editor = MemoryEditor::new(&trace.text);
    if let Some(selection) = trace.selection {
        editor.select(selection);
    }

    tracing::debug!(
        platform = ?controller.platform(),
        steps = trace.steps.len(),
        "replaying trace"
    );

    let mut outcomes = Vec::with_capacity(trace.steps.len());
    for (i, step) in trace.steps.iter().enumerate() {
        let outcome = apply(&mut controller, &mut editor, step)
            .map_err(|e| e.context(format!("step {i}")))?;
        tracing::debug!(step = i, %outcome, "step replayed");
        outcomes.push(StepOutcome {
            step: i,
            outcome,
            composing: controller.is_composing(),
        });
    }

    Ok(Report {
        platform: controller.platform(),
        text: editor.text(),
        selection: editor.selection(),
        composing: controller.is_composing(),
        outcomes,
        events: editor.emitter().log().to_vec(),
        changes: editor.changes().to_vec(),
    })
}

fn apply(
    controller: &mut InputController,
    editor: &mut MemoryEditor,
    step: &Step,
) -> Result<String> {
    let text_node = editor.text_node();
    let signal = |target: &Option<NodeRef>, data: &str| {
        CompositionSignal::new(target.unwrap_or(text_node), data)
    };

    let outcome = match step {
        Step::CompositionStart { target, data } => {
            let signal = signal(target, data);
            format!("{:?}", controller.composition_start(editor, &signal))
        }
        Step::CompositionUpdate { target, data } => {
            let signal = signal(target, data);
            format!("{:?}", controller.composition_update(editor, &signal))
        }
        Step::CompositionEnd { target, data } => {
            let signal = signal(target, data);
            format!("{:?}", controller.composition_end(editor, &signal))
        }
        Step::RunMicrotasks => match controller.run_microtasks(editor) {
            Some(transition) => format!("{transition:?}"),
            None => "Idle".to_string(),
        },
        Step::BeforeInput {
            input_type,
            data,
            plain_text,
            range,
        } => {
            let mut event = BeforeInputEvent::new(input_type.clone());
            if let Some(data) = data {
                event = event.with_data(data.as_str());
            }
            if let Some(text) = plain_text {
                event = event
                    .with_data_transfer(DataTransfer::new().with_data("text/plain", text.as_str()));
            }
            if let Some((start, end)) = *range {
                event = event.with_target_range(editor.native_range(start, end));
            }
            let result = controller.before_input(editor, &mut event);
            format!("{result:?}")
        }
        Step::ApiInsert { index, text } => {
            if *index > editor.len() {
                bail!("insert index {} past end of document ({})", index, editor.len());
            }
            editor.insert_text(*index, text, Source::Api);
            let delta = Delta::new()
                .retain(*index)
                .insert(text.as_str(), Default::default());
            let marked = controller.text_change(editor, &delta, Source::Api);
            format!("TextChange {{ marker_inserted: {marked} }}")
        }
        Step::Select { index, length } => {
            editor.select(Range::new(*index, *length));
            "Selected".to_string()
        }
    };
    Ok(outcome)
}
