//! Protocol declaration macro.

/// Declare a protocol, its operations and a typed call trait.
///
/// Generates one unit struct per operation implementing
/// [`Operation`](crate::Operation), the protocol struct implementing
/// [`Protocol`](crate::Protocol), and a trait with one async method per
/// operation, implemented for [`Messenger`](crate::Messenger) of that protocol.
///
/// ```rust,ignore
/// define_protocol! {
///     /// Tab management.
///     pub protocol TabProtocol: TabCalls {
///         /// Open a new tab at `url`.
///         open_new_tab => OpenNewTab("openNewTab"): OpenTabRequest => OpenTabResponse;
///         ping => Ping("ping"): () => String;
///     }
/// }
///
/// let tab = messenger.open_new_tab(OpenTabRequest { url }).await?;
/// ```
#[macro_export]
macro_rules! define_protocol {
    (
        $(#[$pmeta:meta])*
        $vis:vis protocol $proto:ident : $calls:ident {
            $(
                $(#[$ometa:meta])*
                $method:ident => $op:ident ( $name:literal ) : $input:ty => $output:ty ;
            )*
        }
    ) => {
        $(#[$pmeta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $proto;

        impl $crate::Protocol for $proto {
            const NAME: &'static str = stringify!($proto);
            const OPERATIONS: &'static [&'static str] = &[$($name),*];
        }

        $(
            $(#[$ometa])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            $vis struct $op;

            impl $crate::Operation for $op {
                const NAME: &'static str = $name;
                type Input = $input;
                type Output = $output;
                type Protocol = $proto;
            }
        )*

        #[doc = concat!("Typed calls of [`", stringify!($proto), "`].")]
        $vis trait $calls {
            $(
                $(#[$ometa])*
                fn $method(
                    &self,
                    input: $input,
                ) -> impl ::core::future::Future<
                    Output = ::core::result::Result<$output, $crate::MessagingError>,
                > + ::core::marker::Send;
            )*
        }

        impl $calls for $crate::Messenger<$proto> {
            $(
                fn $method(
                    &self,
                    input: $input,
                ) -> impl ::core::future::Future<
                    Output = ::core::result::Result<$output, $crate::MessagingError>,
                > + ::core::marker::Send {
                    self.call::<$op>(input)
                }
            )*
        }
    };
}
