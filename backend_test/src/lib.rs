use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::Parser, punctuated::Punctuated, spanned::Spanned, FnArg, GenericArgument, Ident,
    ItemFn, Pat, PathArguments, Signature, Token, Type,
};

/// Transform an asynchronous test into a synchronous one, inject dependencies,
/// and ensure that the database is cleared regardless of how the test terminates.
///
/// Flags, given as `#[backend_test(admin, populated)]`:
///
/// - `admin`: log the client in as the example admin.
/// - `populated`: insert the example form and its three example submissions.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`],
/// [`mongodb::Database`], [`crate::model::mongodb::Coll<T>`], and, for
/// populated tests, the example form's [`crate::model::mongodb::Id`].
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = syn::parse_macro_input!(input as ItemFn);

    let flags = match Flags::parse(args) {
        Ok(flags) => flags,
        Err(err) => return err.into_compile_error().into(),
    };

    // Extract type information and reject invalid function signatures.
    let (call_args, collections) = match check_sig(item_fn.sig.clone(), &flags) {
        Ok(args) => args,
        Err(err) => return err.into_compile_error().into(),
    };
    let (collection_idents, collection_types): (Vec<_>, Vec<_>) = collections.into_iter().unzip();

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    let maybe_login = flags.admin.then(|| {
        quote! {
            crate::model::mongodb::Coll::<crate::model::db::admin::NewAdmin>::from_db(&db)
                .insert_one(crate::model::db::admin::NewAdmin::example(), None)
                .await
                .unwrap();

            rocket_client
                .post(uri!(crate::api::auth::authenticate))
                .header(rocket::http::ContentType::JSON)
                .body(rocket::serde::json::json!(crate::model::api::admin::AdminCredentials::example1()).to_string())
                .dispatch()
                .await;
        }
    });

    let maybe_populate = flags.populated.then(|| {
        quote! {
            crate::model::mongodb::Coll::<crate::model::db::form::Form>::from_db(&db)
                .insert_one(
                    crate::model::db::form::Form {
                        id: form_id,
                        form: crate::model::db::form::NewForm::example(),
                    },
                    None,
                )
                .await
                .unwrap();

            crate::model::mongodb::Coll::<crate::model::db::submission::NewSubmission>::from_db(&db)
                .insert_many(
                    [
                        crate::model::db::submission::NewSubmission::example1(form_id),
                        crate::model::db::submission::NewSubmission::example2(form_id),
                        crate::model::db::submission::NewSubmission::example3(form_id),
                    ],
                    None,
                )
                .await
                .unwrap();
        }
    });

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (
                rocket::local::asynchronous::Client,
                mongodb::Database,
                crate::model::mongodb::Id,
            ) {
                let db_client = crate::db_client().await;
                let db_name = crate::database();
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_db(db_client.clone(), &db_name).await,
                )
                .await
                .unwrap();
                let db = db_client.database(&db_name);
                let form_id = crate::model::mongodb::Id::new();

                #maybe_login
                #maybe_populate

                (rocket_client, db, form_id)
            }

            /// The test itself.
            #item_fn

            /// Test cleanup.
            async fn cleanup(db: mongodb::Database) {
                db.drop(None).await.unwrap();
            }

            // Create an async runtime. We need a separate one for inside and
            // outside the `catch_unwind`.
            let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("test-setup-cleanup")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            // Run the setup. Only populated tests use the form ID.
            #[allow(unused_variables)]
            let (rocket_client, db, form_id) = outer_runtime.block_on(setup());

            // Run the test, catching any panics.
            // Use mutexes to safely transfer `!UnwindSafe` data.
            let client_mutex = std::sync::Mutex::new(rocket_client);
            let db_mutex = std::sync::Mutex::new(db.clone());
            let runtime_mutex = std::sync::Mutex::new(inner_runtime);
            let result = std::panic::catch_unwind(|| {
                let rocket_client = client_mutex.into_inner().unwrap();
                let db = db_mutex.into_inner().unwrap();
                let runtime = runtime_mutex.into_inner().unwrap();

                #(
                    let #collection_idents = crate::model::mongodb::Coll::<#collection_types>::from_db(&db);
                )*

                runtime.block_on(#new_name(#(#call_args),*));
            });

            // Run the cleanup.
            outer_runtime.block_on(cleanup(db));

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                std::panic::panic_any(cause);
            }
        }
    }
    .into()
}

/// Options given to the attribute.
#[derive(Default)]
struct Flags {
    admin: bool,
    populated: bool,
}

impl Flags {
    fn parse(args: TokenStream) -> Result<Self, syn::Error> {
        let idents = Punctuated::<Ident, Token![,]>::parse_terminated.parse(args)?;
        let mut flags = Self::default();
        for ident in idents {
            if ident == "admin" {
                flags.admin = true;
            } else if ident == "populated" {
                flags.populated = true;
            } else {
                return Err(syn::Error::new(
                    ident.span(),
                    "Expected `admin` or `populated`",
                ));
            }
        }
        Ok(flags)
    }
}

/// Ensure the wrapped test is async, and work out what to pass for each parameter,
/// in order. Also returns the collections to construct, by binding name and document type.
#[allow(clippy::type_complexity)]
fn check_sig(
    sig: Signature,
    flags: &Flags,
) -> Result<(Vec<TokenStream2>, Vec<(Ident, Ident)>), syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_db = false;
    let mut has_form_id = false;
    let mut call_args = vec![];
    let mut collections = vec![];

    for input in &sig.inputs {
        let FnArg::Typed(pat_type) = input else {
            return Err(syn::Error::new(input.span(), "Test cannot take `self`"));
        };
        let (Pat::Ident(pat_ident), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty)
        else {
            return Err(unexpected(input));
        };

        if let Some(type_ident) = type_path.path.get_ident() {
            let (seen, arg, what) = if type_ident == "Client" {
                (
                    &mut has_client,
                    quote! { rocket_client },
                    "`rocket::local::asynchronous::Client`",
                )
            } else if type_ident == "Database" {
                (&mut has_db, quote! { db }, "`mongodb::Database`")
            } else if type_ident == "Id" {
                if !flags.populated {
                    return Err(syn::Error::new(
                        input.span(),
                        "Only `#[backend_test(populated)]` tests can accept the form `Id`",
                    ));
                }
                (&mut has_form_id, quote! { form_id }, "form `Id`")
            } else {
                return Err(unexpected(input));
            };

            if *seen {
                return Err(syn::Error::new(
                    input.span(),
                    format!("Test cannot accept more than one {what}"),
                ));
            }
            *seen = true;
            call_args.push(arg);
            continue;
        }

        // Valid as the last path segment for any type is itself
        let possible_collection = type_path.path.segments.last().unwrap();
        if possible_collection.ident == "Coll" {
            if let PathArguments::AngleBracketed(generics) = &possible_collection.arguments {
                if let Some(GenericArgument::Type(Type::Path(type_path))) = generics.args.first() {
                    if let Some(type_ident) = type_path.path.get_ident() {
                        let ident = pat_ident.ident.clone();
                        call_args.push(quote! { #ident });
                        collections.push((ident, type_ident.clone()));
                        continue;
                    }
                }
            }
        }

        return Err(unexpected(input));
    }

    Ok((call_args, collections))
}

fn unexpected(input: &FnArg) -> syn::Error {
    syn::Error::new(
        input.span(),
        "Expected one of `client_ident: Client`, `db_ident: Database`, `form_id: Id` or `collection_ident: Coll<T>`",
    )
}
