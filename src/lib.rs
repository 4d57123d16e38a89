/*!
`glucose_loop` — a closed-loop glucose regulation environment.

What it does
- Drives a virtual patient minute by minute under an external controller:
  `controller → (basal, bolus) → pump → patient ← meals ← scenario`,
  `patient → sensor → CGM → controller`.
- Averages every decision interval (`sample_time` one-minute ticks) into an
  observation `(CHO, CGM)`, scores the averaged BG with the asymmetric risk
  index, and ends the episode when BG leaves `[70, 350]` mg/dL.
- Generates realistic daily meal plans from a seeded, per-slot stochastic
  schedule (`ScenarioGenerator`), or replays a fixed list (`FixedScenario`).

How to use (call surface only)
- Implement `Patient`, `Sensor`, and `Pump` for your models (see `systems::sdk`).
- Pick a scenario and build a `SimulationEnvironment` with an `EnvConfig`.
- Either call `step(Action)` yourself, or hand a policy closure to
  `run_episode(&mut env, policy, max_steps)`.

What it does NOT do
- No physiology, no sensor noise model, no pump hardware. No plotting or export.
*/

pub mod error;
pub mod mechanics;
pub mod systems;

pub use error::{BoxError, SimError, SimResult};
pub use systems::sdk::{Action, Observation, Step};
pub use systems::SimulationEnvironment;

/// Totals for one episode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EpisodeSummary {
    pub steps: usize,
    pub total_reward: f64,
    /// True when the episode ended on the glucose safety bound.
    pub terminated: bool,
    pub last: Option<Step>,
}

/// Closed loop: a_t = policy(step_{t-1}); step_t = env.step(a_t).
///
/// Starts from `env.reset()` and stops on `done` or after `max_steps`.
pub fn run_episode<Pol>(
    env: &mut SimulationEnvironment,
    mut policy: Pol,
    max_steps: usize,
) -> SimResult<EpisodeSummary>
where
    Pol: FnMut(&Step) -> Action,
{
    let mut step = env.reset()?;
    let mut out = EpisodeSummary::default();
    for _ in 0..max_steps {
        let action = policy(&step);
        step = env.step(action)?;
        out.steps += 1;
        out.total_reward += step.reward;
        if step.done {
            out.terminated = true;
            break;
        }
    }
    out.last = (out.steps > 0).then_some(step);
    Ok(out)
}
