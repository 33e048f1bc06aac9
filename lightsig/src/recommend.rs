//! Practice recommendations for the Rise Path.

use crate::types::{
    Gating, GatingMode, LightSignature, PriorityMode, Recommendations, ToolRecommendation,
    WeeklyFocus,
};
use instrument::Tool;

fn priority_mode(mode: GatingMode) -> PriorityMode {
    match mode {
        GatingMode::Stabilize => PriorityMode::ToolsFirst,
        GatingMode::BuildRange => PriorityMode::ToolsAndReps,
        GatingMode::Stretch => PriorityMode::RepsOnly,
    }
}

fn tool_recommendation(tool: Tool, primary: bool, ray_name: &str, mode: GatingMode) -> ToolRecommendation {
    let why_now = match (mode, primary) {
        (GatingMode::Stabilize, true) => {
            format!("Lowers load so {} has room to come back online.", ray_name)
        }
        (GatingMode::Stabilize, false) => {
            format!("Creates safety for {} to come back online.", ray_name)
        }
        (_, true) => format!("The most direct way to train {} right now.", ray_name),
        (_, false) => format!("Builds {} range through intentional practice.", ray_name),
    };

    let steps = if primary {
        vec![
            format!("Learn the {} steps today", tool.name()),
            "Use it once in a real moment this week".to_string(),
            "Note what changed afterwards".to_string(),
        ]
    } else {
        vec![
            format!("Start with 1 {} rep this week", tool.name()),
            "Track what you notice".to_string(),
            "A two-minute rep counts. Keep the chain alive.".to_string(),
        ]
    };

    ToolRecommendation {
        tool_id: tool.id(),
        name: tool.name().to_string(),
        why_now,
        steps,
    }
}

/// Build recommendations for the Rise Path under the chosen gate.
pub fn recommend(signature: &LightSignature, gating: &Gating) -> Recommendations {
    let rise = &signature.just_in_ray;
    let rise_name = rise.ray_name.as_str();
    let definition = rise.ray_id.definition();
    let [primary, secondary] = Tool::for_ray(rise.ray_id);

    let what_not_to_do_yet = match gating.mode {
        GatingMode::Stabilize => vec![
            "Avoid stretch goals until load stabilizes".to_string(),
            "Do not force expansion in depleted rays".to_string(),
            "Skip performance optimization and focus on recovery".to_string(),
        ],
        _ => vec![
            "Don't try to improve all rays at once".to_string(),
            "Don't skip tool installation in week one".to_string(),
            "Don't push intensity before consistency is established".to_string(),
        ],
    };

    Recommendations {
        priority_mode: priority_mode(gating.mode),
        tools: vec![
            tool_recommendation(primary, true, rise_name, gating.mode),
            tool_recommendation(secondary, false, rise_name, gating.mode),
        ],
        weekly_focus: WeeklyFocus {
            just_in_ray_id: rise.ray_id,
            focus_rep: format!(
                "{} once a day: one small {} rep.",
                definition.verb, definition.short_name
            ),
            minimum_effective_dose: "1 intentional rep per day, 5 minutes max".to_string(),
        },
        coaching_questions: vec![
            format!("What does {} look like when it is working well in your life?", rise_name),
            format!("When do you most need {} at work?", rise_name),
            "What would change if this capacity improved by just 10%?".to_string(),
        ],
        what_not_to_do_yet,
    }
}
