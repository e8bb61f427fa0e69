//! GraphQL [`Mutation`]s definitions.

use common::DateTime;
use juniper::graphql_object;
use service::{
    command,
    domain::{validation, validation::ReviewForm},
    query, Command as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Submits a new `ListingRequest` along with the car documents.
    ///
    /// Exactly one document of each `DocumentKind` must be uploaded.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current user is neither a renter nor an
    ///                 administrator;
    /// - `VALIDATION_ERROR` - some field or document is missing or malformed;
    /// - `CONFLICT` - a `ListingRequest` for the car number already exists.
    #[tracing::instrument(
        skip_all,
        fields(
            car_number = ?input.car_number,
            gql.name = "submitListingRequest",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn submit_listing_request(
        input: api::listing_request::Input,
        documents: Vec<api::document::Input>,
        ctx: &Context,
    ) -> Result<api::ListingRequest, Error> {
        drop(ctx.renter_session().await?);
        let documents = api::document::Input::decode_all(documents)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::SubmitListingRequest {
                form: input.into(),
                documents,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Approves the pending `ListingRequest` with the specified ID, listing
    /// its `Car`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current user is not an administrator;
    /// - `NOT_FOUND` - the `ListingRequest` does not exist;
    /// - `VALIDATION_ERROR` - the requested availability period is malformed;
    /// - `CONFLICT` - a `Car` with the same number is already listed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "approveListingRequest",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn approve_listing_request(
        id: api::listing_request::Id,
        ctx: &Context,
    ) -> Result<api::ListingRequest, Error> {
        drop(ctx.admin_session().await?);

        ctx.service()
            .execute(command::ApproveListingRequest { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Disapproves the `ListingRequest` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current user is not an administrator;
    /// - `NOT_FOUND` - the `ListingRequest` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "disapproveListingRequest",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn disapprove_listing_request(
        id: api::listing_request::Id,
        ctx: &Context,
    ) -> Result<api::ListingRequest, Error> {
        drop(ctx.admin_session().await?);

        ctx.service()
            .execute(command::DisapproveListingRequest { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `ListingRequest` with the specified ID along with its
    /// documents.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current user is not an administrator;
    /// - `NOT_FOUND` - the `ListingRequest` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteListingRequest",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_listing_request(
        id: api::listing_request::Id,
        ctx: &Context,
    ) -> Result<api::ListingRequest, Error> {
        drop(ctx.admin_session().await?);

        ctx.service()
            .execute(command::DeleteListingRequest { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists a `Car` for every approved `ListingRequest` having none yet.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current user is not an administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "materializeApprovedListings",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn materialize_approved_listings(
        ctx: &Context,
    ) -> Result<api::listing_request::Materialized, Error> {
        drop(ctx.admin_session().await?);

        ctx.service()
            .execute(command::MaterializeApprovedListings)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists a new `Car` directly.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current user is not an administrator;
    /// - `VALIDATION_ERROR` - some field or the image is missing or malformed;
    /// - `CONFLICT` - a `Car` with the same number is already listed.
    #[tracing::instrument(
        skip_all,
        fields(
            car_number = ?input.car_number,
            gql.name = "createCar",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_car(
        input: api::car::Input,
        image: Option<api::document::Input>,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        drop(ctx.admin_session().await?);
        let image = image
            .map(api::document::Input::decode)
            .transpose()
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::CreateCar {
                form: input.into(),
                image,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Edits the `Car` with the specified ID, mirroring the edit onto its
    /// `ListingRequest`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Car` does not exist;
    /// - `FORBIDDEN` - the `Car` belongs to another renter;
    /// - `VALIDATION_ERROR` - some provided field is malformed;
    /// - `CONFLICT` - the new car number is already in use.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateCar",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_car(
        id: api::car::Id,
        edit: api::car::EditInput,
        image: Option<api::document::Input>,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        authorize_car_owner(id, ctx).await?;
        let image = image
            .map(api::document::Input::decode)
            .transpose()
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::UpdateCar {
                id: id.into(),
                edit: edit.into(),
                image,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Delists the `Car` with the specified ID, deleting its
    /// `ListingRequest`s as well.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Car` does not exist;
    /// - `FORBIDDEN` - the `Car` belongs to another renter.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteCar",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_car(
        id: api::car::Id,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        authorize_car_owner(id, ctx).await?;

        ctx.service()
            .execute(command::DeleteCar { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Books a `Car` for the current user.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VALIDATION_ERROR` - some field is missing or malformed;
    /// - `NOT_FOUND` - the `Car` is not listed;
    /// - `CONFLICT` - the `Car` is already booked.
    #[tracing::instrument(
        skip_all,
        fields(
            car_number = ?input.car_number,
            gql.name = "createTicket",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_ticket(
        input: api::ticket::Input,
        ctx: &Context,
    ) -> Result<api::Ticket, Error> {
        let session = ctx.current_session().await?;

        ctx.service()
            .execute(command::CreateTicket {
                user_id: session.user_id,
                email: session.email,
                form: input.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the `Ticket` with the specified ID, refunding its payment.
    ///
    /// Administrators may cancel any `Ticket`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Ticket` does not exist;
    /// - `FORBIDDEN` - the `Ticket` belongs to another customer;
    /// - `CONFLICT` - the `Ticket` is already cancelled or expired, or its
    ///                payment is not captured;
    /// - `UPSTREAM_FAILURE` - the payment gateway failed to refund.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelTicket",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_ticket(
        id: api::ticket::Id,
        ctx: &Context,
    ) -> Result<api::Ticket, Error> {
        let session = ctx.current_session().await?;

        ctx.service()
            .execute(command::CancelTicket {
                id: id.into(),
                owner: (!session.is_admin()).then_some(session.user_id),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Leaves a `Review` of the `Car` with the specified ID, recalculating
    /// its rating.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VALIDATION_ERROR` - the rating or text is missing or malformed;
    /// - `NOT_FOUND` - the `Car` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            car_id = %car_id,
            gql.name = "submitReview",
            otel.name = Self::SPAN_NAME,
            rating = ?rating,
        ),
    )]
    pub async fn submit_review(
        car_id: api::car::Id,
        author_name: String,
        rating: Option<i32>,
        review: Option<String>,
        ctx: &Context,
    ) -> Result<api::review::Submitted, Error> {
        let session = ctx.current_session().await?;
        let author_name = validation::name(&author_name)
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(command::SubmitReview {
                car_id: car_id.into(),
                author_id: session.user_id,
                author_name,
                form: ReviewForm { rating, review },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Sends a verification code to the email of a registering user.
    ///
    /// Returns the `DateTime` when the code expires.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VALIDATION_ERROR` - some field is missing or malformed;
    /// - `UPSTREAM_FAILURE` - the code could not be sent.
    #[tracing::instrument(
        skip_all,
        fields(
            email = ?input.email,
            gql.name = "issueVerificationCode",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn issue_verification_code(
        input: api::verification::Input,
        ctx: &Context,
    ) -> Result<DateTime, Error> {
        ctx.service()
            .execute(command::IssueVerificationCode { form: input.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|expires_at| expires_at.coerce())
    }

    /// Confirms the verification code sent to the specified email, returning
    /// the registration it was issued for.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VALIDATION_ERROR` - the email or code is malformed;
    /// - `NOT_FOUND` - the code is wrong or expired.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "confirmVerificationCode",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn confirm_verification_code(
        email: String,
        code: String,
        ctx: &Context,
    ) -> Result<api::verification::Registration, Error> {
        ctx.service()
            .execute(command::ConfirmVerificationCode { email, code })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Ensures the current user may manage the [`api::Car`] with the provided ID.
///
/// # Errors
///
/// Errors if the [`api::Car`] doesn't exist, or the current user is neither
/// an administrator nor its owner.
async fn authorize_car_owner(
    id: api::car::Id,
    ctx: &Context,
) -> Result<(), Error> {
    let car = ctx
        .service()
        .execute(query::car::ById::by(id.into()))
        .await
        .map_err(AsError::into_error)
        .map_err(ctx.error())?
        .ok_or_else(|| CarError::NotExists.into())
        .map_err(ctx.error())?;
    ctx.owner_session(&car.owner_email).await.map(drop)
}

define_error! {
    enum CarError {
        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`Car` with the specified ID does not exist"]
        NotExists,
    }
}
