use dioxus::prelude::*;

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonVariant {
    #[default]
    Primary,
    Secondary,
    Ghost,
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonSize {
    #[default]
    Regular,
    /// Square, for pager page numbers.
    Compact,
}

#[derive(Props, Clone, PartialEq)]
pub struct ButtonProps {
    #[props(optional)]
    pub class: Option<String>,
    #[props(optional)]
    pub variant: Option<ButtonVariant>,
    #[props(optional)]
    pub size: Option<ButtonSize>,
    #[props(optional)]
    pub disabled: Option<bool>,
    #[props(optional)]
    pub aria_label: Option<String>,
    /// Marks the button as the current item of a set (e.g. the active page).
    #[props(optional)]
    pub aria_current: Option<bool>,
    #[props(optional)]
    pub onclick: Option<EventHandler<MouseEvent>>,
    pub children: Element,
}

#[component]
pub fn Button(props: ButtonProps) -> Element {
    let variant = props.variant.unwrap_or_default();
    let size = props.size.unwrap_or_default();
    let disabled = props.disabled.unwrap_or(false);

    let base = "inline-flex items-center justify-center rounded-md text-sm font-medium transition-colors focus:outline-none focus:ring-2 focus:ring-offset-2 disabled:opacity-50 disabled:pointer-events-none";

    let variant_class = match variant {
        ButtonVariant::Primary => "bg-slate-900 text-white hover:bg-slate-700 focus:ring-slate-500",
        ButtonVariant::Secondary => "border border-slate-300 bg-white text-slate-900 hover:bg-slate-100 focus:ring-slate-400",
        ButtonVariant::Ghost => "bg-transparent text-slate-700 hover:bg-slate-100 focus:ring-slate-400",
    };

    let size_class = match size {
        ButtonSize::Regular => "h-9 px-4 py-2",
        ButtonSize::Compact => "h-9 w-9",
    };

    let class = match props.class {
        Some(extra) if !extra.is_empty() => format!("{} {} {} {}", base, variant_class, size_class, extra),
        _ => format!("{} {} {}", base, variant_class, size_class),
    };

    let aria_current = props.aria_current.unwrap_or(false).then_some("page");

    rsx! {
        button {
            class,
            r#type: "button",
            disabled,
            "aria-label": props.aria_label,
            "aria-current": aria_current,
            onclick: move |evt| {
                if disabled {
                    return;
                }
                if let Some(handler) = &props.onclick {
                    handler.call(evt);
                }
            },
            {props.children}
        }
    }
}
