//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants from
//! reducers.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use bashi_core::async_effect;
///
/// async_effect! {
///     let events = data.get_events().await.ok()?;
///     Some(AppAction::EventsLoaded { events })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Wrap an effect so it can be aborted later with `Effect::Cancel`
///
/// # Example
///
/// ```rust,ignore
/// use bashi_core::cancellable;
///
/// cancellable! {
///     id: "checkout",
///     effect: gateway_effect
/// }
/// ```
#[macro_export]
macro_rules! cancellable {
    (
        id: $id:expr,
        effect: $effect:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $crate::effect::EffectId::new($id),
            effect: ::std::boxed::Box::new($effect),
        }
    };
}
