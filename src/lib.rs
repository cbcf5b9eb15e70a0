pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod mode;
pub mod options;
pub mod selector;
pub mod sequencer;
pub mod storage;
pub mod theme;

pub use controller::DecisionController;
pub use error::PickerError;
pub use mode::Mode;
pub use options::OptionList;
pub use selector::Pick;
pub use sequencer::{RevealPhase, SequencerState};

use clock::{BrowserClock, Clock};
use config::{PickerConfig, Timing};
use events::{Notice, Notifier, PhaseEvent, Renderer};
use gloo_timers::future::TimeoutFuture;
use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;
use storage::LocalStore;
use theme::Theme;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen_futures::spawn_local;
use web_sys::{window, HtmlInputElement};
use yew::prelude::*;

type Controller = DecisionController<LocalStore, ThreadRng>;

const REMOVE_ANIMATION_MS: u32 = 300;
const INPUT_FOCUS_DELAY_MS: u32 = 300;
const CONFETTI_PIECES: usize = 60;
const CONFETTI_MS: u32 = 5000;
const CONFETTI_COLORS: [&str; 5] = ["#4a90e2", "#38a169", "#e65a5a", "#ed8936", "#7bb1f0"];

#[derive(Clone, PartialEq, Default)]
struct View {
    options: Vec<String>,
    mode: Mode,
    remaining: usize,
    full: bool,
    theme: Theme,
    phase: Option<PhaseEvent>,
}

struct OptionsView {
    options: Vec<String>,
    mode: Mode,
    remaining: usize,
    full: bool,
}

enum ViewAction {
    Options(OptionsView),
    Phase(PhaseEvent),
    Theme(Theme),
}

impl Reducible for View {
    type Action = ViewAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            ViewAction::Options(update) => {
                next.options = update.options;
                next.mode = update.mode;
                next.remaining = update.remaining;
                next.full = update.full;
            }
            ViewAction::Phase(PhaseEvent::Idle) => next.phase = None,
            ViewAction::Phase(event) => next.phase = Some(event),
            ViewAction::Theme(theme) => next.theme = theme,
        }
        Rc::new(next)
    }
}

struct ViewRenderer(UseReducerDispatcher<View>);

impl Renderer for ViewRenderer {
    fn options_changed(&mut self, options: &OptionList, mode: Mode) {
        let max = mode.max_options();
        self.0.dispatch(ViewAction::Options(OptionsView {
            options: options.iter().map(str::to_string).collect(),
            mode,
            remaining: options.remaining(max),
            full: options.is_full(max),
        }));
    }

    fn phase_changed(&mut self, event: &PhaseEvent) {
        self.0.dispatch(ViewAction::Phase(event.clone()));
    }

    fn theme_changed(&mut self, theme: Theme) {
        self.0.dispatch(ViewAction::Theme(theme));
    }
}

#[derive(Clone, PartialEq)]
struct Toast {
    id: u32,
    notice: Notice,
}

#[derive(Clone, PartialEq, Default)]
struct Toasts {
    items: Vec<Toast>,
}

enum ToastAction {
    Push(Toast),
    Dismiss(u32),
}

impl Reducible for Toasts {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            ToastAction::Push(toast) => next.items.push(toast),
            ToastAction::Dismiss(id) => next.items.retain(|toast| toast.id != id),
        }
        Rc::new(next)
    }
}

struct ToastNotifier {
    dispatcher: UseReducerDispatcher<Toasts>,
    next_id: u32,
}

impl Notifier for ToastNotifier {
    fn notify(&mut self, notice: Notice) {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let duration = notice.duration_ms;
        self.dispatcher.dispatch(ToastAction::Push(Toast { id, notice }));

        let dispatcher = self.dispatcher.clone();
        spawn_local(async move {
            TimeoutFuture::new(duration).await;
            dispatcher.dispatch(ToastAction::Dismiss(id));
        });
    }
}

#[derive(Clone, PartialEq)]
struct ConfettiPiece {
    left: f64,
    delay: f64,
    width: f64,
    height: f64,
    duration: f64,
    color: &'static str,
}

fn confetti_burst() -> Vec<ConfettiPiece> {
    let mut rng = rand::thread_rng();
    (0..CONFETTI_PIECES)
        .map(|_| ConfettiPiece {
            left: rng.gen_range(0.0..100.0),
            delay: rng.gen_range(0.0..2.0),
            width: rng.gen_range(6.0..18.0),
            height: rng.gen_range(12.0..30.0),
            duration: rng.gen_range(3.0..5.0),
            color: CONFETTI_COLORS[rng.gen_range(0..CONFETTI_COLORS.len())],
        })
        .collect()
}

fn drive(controller: Rc<RefCell<Controller>>) {
    spawn_local(async move {
        loop {
            let Some(due) = controller.borrow().next_due() else {
                break;
            };
            let wait = due.saturating_sub(BrowserClock.now_ms());
            TimeoutFuture::new(u32::try_from(wait).unwrap_or(u32::MAX)).await;
            controller.borrow_mut().poll(BrowserClock.now_ms());
        }
    });
}

#[function_component(App)]
fn app() -> Html {
    let view = use_reducer(View::default);
    let toasts = use_reducer(Toasts::default);
    let confetti = use_state(Vec::<ConfettiPiece>::new);
    let show_clear_confirm = use_state(|| false);
    let removing = use_state(|| None::<usize>);
    let input_ref = use_node_ref();
    let config = use_memo(|_| PickerConfig::default().sanitized(), ());

    let controller = {
        let view_dispatcher = view.dispatcher();
        let toast_dispatcher = toasts.dispatcher();
        let config = (*config).clone();
        use_mut_ref(move || {
            Controller::load(LocalStore, rand::thread_rng(), config)
                .with_renderer(Box::new(ViewRenderer(view_dispatcher)))
                .with_notifier(Box::new(ToastNotifier {
                    dispatcher: toast_dispatcher,
                    next_id: 0,
                }))
        })
    };
    // Rendering never borrows the controller: callbacks hold it mutably
    // while the renderer dispatches.
    let timing = &config.timing;

    use_effect_with_deps(
        move |theme: &Theme| {
            if let Some(body) = window()
                .and_then(|window| window.document())
                .and_then(|document| document.body())
            {
                let _ = body
                    .class_list()
                    .toggle_with_force("dark", *theme == Theme::Dark);
            }
            || ()
        },
        view.theme,
    );

    {
        let input_ref = input_ref.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    TimeoutFuture::new(INPUT_FOCUS_DELAY_MS).await;
                    if let Some(input) = input_ref.cast::<HtmlInputElement>() {
                        let _ = input.focus();
                    }
                });
                || ()
            },
            (),
        );
    }

    let on_add = {
        let controller = controller.clone();
        let input_ref = input_ref.clone();
        Callback::from(move |_: ()| {
            let Some(input) = input_ref.cast::<HtmlInputElement>() else {
                return;
            };
            if controller.borrow_mut().add_option(&input.value()).is_ok() {
                input.set_value("");
            }
            let _ = input.focus();
        })
    };

    let on_add_click = {
        let on_add = on_add.clone();
        Callback::from(move |_: MouseEvent| on_add.emit(()))
    };

    let on_input_key = {
        let on_add = on_add.clone();
        Callback::from(move |event: KeyboardEvent| {
            if event.key() == "Enter" {
                on_add.emit(());
            }
        })
    };

    let on_remove = {
        let controller = controller.clone();
        let removing = removing.clone();
        Callback::from(move |index: usize| {
            if removing.is_some() {
                return;
            }
            if controller.borrow().is_busy() {
                // Refused straight away so the notice explains why.
                let _ = controller.borrow_mut().remove_option(index);
                return;
            }
            removing.set(Some(index));
            let controller = controller.clone();
            let removing = removing.clone();
            spawn_local(async move {
                TimeoutFuture::new(REMOVE_ANIMATION_MS).await;
                let _ = controller.borrow_mut().remove_option(index);
                removing.set(None);
            });
        })
    };

    let on_toggle_mode = {
        let controller = controller.clone();
        Callback::from(move |_: MouseEvent| {
            let _ = controller.borrow_mut().toggle_mode();
        })
    };

    let on_toggle_theme = {
        let controller = controller.clone();
        Callback::from(move |_: MouseEvent| {
            let _ = controller.borrow_mut().toggle_theme();
        })
    };

    let on_decide = {
        let controller = controller.clone();
        Callback::from(move |_: MouseEvent| {
            let started = controller.borrow_mut().start(BrowserClock.now_ms());
            if started.is_ok() {
                drive(controller.clone());
            }
        })
    };

    let request_clear = {
        let controller = controller.clone();
        let show_clear_confirm = show_clear_confirm.clone();
        Callback::from(move |_: MouseEvent| {
            let has_options = !controller.borrow().options().is_empty();
            if has_options && !controller.borrow().is_busy() {
                show_clear_confirm.set(true);
            } else {
                // Let the controller explain why there is nothing to clear.
                let _ = controller.borrow_mut().clear_options();
            }
        })
    };

    let confirm_clear = {
        let controller = controller.clone();
        let show_clear_confirm = show_clear_confirm.clone();
        Callback::from(move |_: MouseEvent| {
            let _ = controller.borrow_mut().clear_options();
            show_clear_confirm.set(false);
        })
    };

    let cancel_clear = {
        let show_clear_confirm = show_clear_confirm.clone();
        Callback::from(move |_: MouseEvent| show_clear_confirm.set(false))
    };

    let on_open_envelope = {
        let controller = controller.clone();
        let confetti = confetti.clone();
        Callback::from(move |_: MouseEvent| {
            if controller.borrow_mut().acknowledge().is_ok() {
                confetti.set(confetti_burst());
                let confetti = confetti.clone();
                spawn_local(async move {
                    TimeoutFuture::new(CONFETTI_MS).await;
                    confetti.set(Vec::new());
                });
            }
        })
    };

    let on_back = {
        let controller = controller.clone();
        let confetti = confetti.clone();
        let input_ref = input_ref.clone();
        Callback::from(move |_: MouseEvent| {
            if controller.borrow_mut().reset().is_ok() {
                confetti.set(Vec::new());
                if let Some(input) = input_ref.cast::<HtmlInputElement>() {
                    let _ = input.focus();
                }
            }
        })
    };

    let busy = view.phase.is_some();
    let max = view.mode.max_options();
    let full = view.full;
    let counter_class = classes!("options-counter", if full { "full" } else { "open" });
    let placeholder = if full {
        format!("Limit reached ({max} options)")
    } else {
        "Type an option".to_string()
    };
    let mode_button_label = format!("Switch to {}", view.mode.toggled().label());

    let reveal = match &view.phase {
        Some(PhaseEvent::Reveal { phase, pick }) => Some((*phase, pick.clone())),
        _ => None,
    };
    let main_hidden = matches!(&reveal, Some((phase, _)) if !phase.shows_cards());

    html! {
        <div class="app-container">
            <header class="app-header">
                <h1>{ "Opta" }</h1>
                <span class="mode-badge">{ view.mode.label() }</span>
                <button class="theme-toggle"
                    aria-label={view.theme.toggle_label()}
                    onclick={on_toggle_theme}>
                    { view.theme.icon() }
                </button>
            </header>

            <main id="mainContent" class={classes!("content", main_hidden.then_some("hidden"))}>
                <div class="input-row">
                    <input id="optionInput"
                        ref={input_ref.clone()}
                        type="text"
                        placeholder={placeholder}
                        disabled={busy || full}
                        onkeydown={on_input_key} />
                    <button id="addOptionBtn" disabled={busy || full} onclick={on_add_click}>
                        { "Add" }
                    </button>
                    <span class={counter_class}
                        title={format!("{} more allowed", view.remaining)}>
                        { format!("{}/{}", view.options.len(), max) }
                    </span>
                </div>

                <div class="actions">
                    <button id="modeToggleBtn" disabled={busy} onclick={on_toggle_mode}>
                        <span class="mode-text">{ mode_button_label }</span>
                    </button>
                    <button id="decideBtn" disabled={busy} onclick={on_decide}>{ "Decide" }</button>
                    <button id="clearBtn" disabled={busy} onclick={request_clear}>{ "Clear" }</button>
                </div>

                {
                    if *show_clear_confirm {
                        html! {
                            <div class="clear-confirm">
                                <p>{ format!("Remove all {} options?", view.options.len()) }</p>
                                <div class="confirm-actions">
                                    <button class="confirm-yes" onclick={confirm_clear}>{ "Yes" }</button>
                                    <button class="confirm-no" onclick={cancel_clear}>{ "No" }</button>
                                </div>
                            </div>
                        }
                    } else {
                        html! {}
                    }
                }
            </main>

            { render_countdown(&view.phase, timing) }
            { render_cards(&view, reveal.as_ref(), *removing, timing, &on_remove) }
            { render_envelope(reveal.as_ref(), view.mode, on_open_envelope, on_back) }
            { render_confetti(&confetti) }
            { render_toasts(&toasts) }
        </div>
    }
}

fn render_countdown(phase: &Option<PhaseEvent>, timing: &Timing) -> Html {
    let Some(PhaseEvent::Countdown { remaining }) = phase else {
        return html! {};
    };
    let total = timing.countdown_from.max(1);
    let progress = f64::from(total.saturating_sub(*remaining)) / f64::from(total) * 100.0;

    html! {
        <div id="countdown" class="countdown active">
            <div id="countdownNumber" class="countdown-number">{ remaining.to_string() }</div>
            <div class="countdown-bar">
                <div class="countdown-fill" style={format!("width: {progress:.0}%")}></div>
            </div>
        </div>
    }
}

fn render_cards(
    view: &View,
    reveal: Option<&(RevealPhase, Pick)>,
    removing: Option<usize>,
    timing: &Timing,
    on_remove: &Callback<usize>,
) -> Html {
    if let Some((phase, _)) = reveal {
        if !phase.shows_cards() {
            return html! {};
        }
    }

    if view.options.is_empty() {
        return html! {
            <div id="cardsContainer" class="cards-container">
                <div class="empty-state">
                    <div class="empty-state-text">
                        <p>{ "No options yet" }</p>
                        <small>{ "Type an option above and press \"Add\"" }</small>
                    </div>
                </div>
            </div>
        };
    }

    let busy = view.phase.is_some();
    let container_classes = classes!("cards-container", reveal.is_some().then_some("animating"));

    html! {
        <div id="cardsContainer" class={container_classes}>
            {
                if let Some((phase, _)) = reveal {
                    html! {
                        <div class="animation-overlay">
                            <div class="animation-text">{ phase.caption().unwrap_or_default() }</div>
                            <div class="animation-dots">
                                <div class="animation-dot"></div>
                                <div class="animation-dot"></div>
                                <div class="animation-dot"></div>
                            </div>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
            { for view.options.iter().enumerate().map(|(index, option)| {
                let phase = reveal.map(|(phase, _)| *phase);
                render_card(index, option, phase, removing == Some(index), timing, busy, on_remove)
            }) }
        </div>
    }
}

fn render_card(
    index: usize,
    option: &str,
    phase: Option<RevealPhase>,
    removing: bool,
    timing: &Timing,
    busy: bool,
    on_remove: &Callback<usize>,
) -> Html {
    let on_delete = {
        let on_remove = on_remove.clone();
        Callback::from(move |event: MouseEvent| {
            event.stop_propagation();
            on_remove.emit(index);
        })
    };

    let (phase_class, style) = match phase {
        Some(phase) => (Some(phase.name()), card_motion(index, phase, timing)),
        None => (None, String::new()),
    };

    html! {
        <div key={option.to_string()}
            class={classes!("option-card", phase_class, removing.then_some("removing"))}
            data-index={index.to_string()}
            style={style}>
            <div class="card-header">
                <div class="card-number">{ (index + 1).to_string() }</div>
                <button class="card-delete-btn"
                    aria-label="Remove option"
                    disabled={busy}
                    onclick={on_delete}>
                    { "✕" }
                </button>
            </div>
            <div class="card-content">
                <div class="card-text">{ option }</div>
            </div>
            {
                if phase.is_some() {
                    html! {
                        <div class="card-back">
                            <div class="card-back-pattern"></div>
                            <div class="card-back-symbol">{ "♠️" }</div>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

// Seeded by card position so a re-render does not make the cards jump.
fn card_motion(index: usize, phase: RevealPhase, timing: &Timing) -> String {
    let mut rng = StdRng::seed_from_u64(index as u64);
    let side = if index % 2 == 0 { 1.0 } else { -1.0 };
    let delay = u64::from(phase.stagger_ms(timing)) * index as u64;
    format!(
        "animation-delay: {delay}ms; --end-rotate: {:.1}deg; --shuffle-x1: {:.1}px; --shuffle-y1: {:.1}px; --shuffle-rotate1: {:.1}deg; --shuffle-x2: {:.1}px; --shuffle-y2: {:.1}px; --shuffle-rotate2: {:.1}deg;",
        side * rng.gen_range(10.0..30.0),
        rng.gen_range(-50.0..50.0),
        rng.gen_range(-30.0..30.0),
        rng.gen_range(-90.0..90.0),
        rng.gen_range(-40.0..40.0),
        rng.gen_range(-20.0..20.0),
        rng.gen_range(-180.0..180.0),
    )
}

fn render_envelope(
    reveal: Option<&(RevealPhase, Pick)>,
    mode: Mode,
    on_open: Callback<MouseEvent>,
    on_back: Callback<MouseEvent>,
) -> Html {
    let Some((phase, pick)) = reveal else {
        return html! {};
    };
    let opened = match phase {
        RevealPhase::Envelope => false,
        RevealPhase::Opened => true,
        _ => return html! {},
    };

    html! {
        <>
            <div id="envelopeContainer" class="envelope-container">
                <div id="envelope"
                    class={classes!("envelope", opened.then_some("hidden"))}
                    onclick={on_open}>
                    <div class="envelope-front">
                        <div class="envelope-flap"></div>
                        <div class="envelope-seal">{ if opened { "🎉" } else { "?" } }</div>
                    </div>
                    <div class="envelope-back"></div>
                </div>
                <div id="letterReveal" class={classes!("letter-reveal", opened.then_some("show"))}>
                    <div class="letter-content">
                        <div class="letter-title">{ format!("{}!", mode.verdict().to_uppercase()) }</div>
                        <div class="letter-winner">{ &pick.winner }</div>
                    </div>
                </div>
            </div>
            {
                if opened {
                    html! {
                        <button id="resetWinnerBtn" class="reset-winner-btn" onclick={on_back}>
                            { "Back to the options" }
                        </button>
                    }
                } else {
                    html! {}
                }
            }
        </>
    }
}

fn render_confetti(pieces: &[ConfettiPiece]) -> Html {
    if pieces.is_empty() {
        return html! {};
    }
    html! {
        <div id="confettiContainer" class="confetti-container">
            { for pieces.iter().map(|piece| {
                let style = format!(
                    "left: {:.1}%; animation-delay: {:.2}s; width: {:.0}px; height: {:.0}px; background: {}; animation-duration: {:.2}s;",
                    piece.left, piece.delay, piece.width, piece.height, piece.color, piece.duration
                );
                html! { <div class="confetti" style={style}></div> }
            }) }
        </div>
    }
}

fn render_toasts(toasts: &Toasts) -> Html {
    html! {
        <div class="notifications">
            { for toasts.items.iter().map(|toast| {
                html! {
                    <div key={toast.id.to_string()} class={classes!("notification", toast.notice.level.class())}>
                        <span class="notification-icon">{ toast.notice.level.icon() }</span>
                        <span class="notification-text">{ &toast.notice.message }</span>
                    </div>
                }
            }) }
        </div>
    }
}

#[wasm_bindgen(start)]
pub fn run_app() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
