use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    /// Display token derived from the completion instant.
    pub token: AttrValue,
    pub on_reset: Callback<()>,
}

/// Shown once every station is checked off. The token is for event staff
/// to eyeball, nothing more.
#[function_component(CompletionBanner)]
pub fn completion_banner(props: &Props) -> Html {
    let on_reset = {
        let cb = props.on_reset.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };
    html! {
        <section class="ohq-banner" role="status">
            <h2>{ "Hunt complete!" }</h2>
            <p>{ "Show this code at the front desk to claim your prize:" }</p>
            <p class="ohq-token"><code>{ props.token.clone() }</code></p>
            <button class="ohq-reset" onclick={on_reset}>{ "Start over" }</button>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;

    #[test]
    fn banner_shows_token_and_reset_control() {
        let props = Props {
            token: AttrValue::from("OHQ-R4-LOYW3V28"),
            on_reset: Callback::noop(),
        };
        let html = block_on(LocalServerRenderer::<CompletionBanner>::with_props(props).render());
        assert!(html.contains("OHQ-R4-LOYW3V28"));
        assert!(html.contains("Start over"));
    }
}
