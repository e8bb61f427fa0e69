//! GraphQL [`Query`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{
    domain::{user, validation},
    query, read, Query as _,
};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `Viewer`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "viewer",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn viewer(ctx: &Context) -> Result<api::user::Viewer, Error> {
        ctx.current_session().await.map(Into::into)
    }

    /// Fetches `ListingRequest`s, optionally filtered by their status.
    ///
    /// Renters only see their own `ListingRequest`s, while administrators may
    /// filter them by the owner email.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current user is neither a renter nor an
    ///                 administrator;
    /// - `VALIDATION_ERROR` - the provided owner email is malformed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "listingRequests",
            otel.name = Self::SPAN_NAME,
            owner_email = ?owner_email,
            status = ?status,
        ),
    )]
    pub async fn listing_requests(
        status: Option<api::listing_request::Status>,
        owner_email: Option<String>,
        ctx: &Context,
    ) -> Result<Vec<api::ListingRequest>, Error> {
        let owner_email = owner_filter(owner_email, ctx).await?;

        ctx.service()
            .execute(query::listing_request::List::by(
                read::listing_request::Filter {
                    status: status.map(Into::into),
                    owner_email,
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|rs| rs.into_iter().map(Into::into).collect())
    }

    /// Returns the `ListingRequest` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `ListingRequest` with the specified ID does not
    ///                 exist;
    /// - `FORBIDDEN` - the `ListingRequest` belongs to another renter.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "listingRequest",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn listing_request(
        id: api::listing_request::Id,
        ctx: &Context,
    ) -> Result<api::ListingRequest, Error> {
        let request = ctx
            .service()
            .execute(query::listing_request::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ListingRequestError::NotExists.into())
            .map_err(ctx.error())?;
        drop(ctx.owner_session(&request.owner.email).await?);

        Ok(request.into())
    }

    /// Fetches listed `Car`s.
    ///
    /// Renters only see their own `Car`s, while administrators may filter
    /// them by the owner email.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current user is neither a renter nor an
    ///                 administrator;
    /// - `VALIDATION_ERROR` - the provided owner email is malformed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cars",
            otel.name = Self::SPAN_NAME,
            owner_email = ?owner_email,
        ),
    )]
    pub async fn cars(
        owner_email: Option<String>,
        ctx: &Context,
    ) -> Result<Vec<api::Car>, Error> {
        let owner_email = owner_filter(owner_email, ctx).await?;

        ctx.service()
            .execute(query::car::List::by(read::car::Filter {
                owner_email,
                offer: None,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|cs| cs.into_iter().map(Into::into).collect())
    }

    /// Counts listed `Car`s, the same way `cars` lists them.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "carsCount",
            otel.name = Self::SPAN_NAME,
            owner_email = ?owner_email,
        ),
    )]
    pub async fn cars_count(
        owner_email: Option<String>,
        ctx: &Context,
    ) -> Result<i32, Error> {
        let owner_email = owner_filter(owner_email, ctx).await?;

        ctx.service()
            .execute(query::car::TotalCount::by(read::car::Filter {
                owner_email,
                offer: None,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Car` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Car` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "car",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn car(
        id: api::car::Id,
        ctx: &Context,
    ) -> Result<api::Car, Error> {
        ctx.service()
            .execute(query::car::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| CarError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Searches `Car`s available for booking in the specified city for some
    /// part of the specified period.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VALIDATION_ERROR` - the city is unknown or the period is reversed.
    #[tracing::instrument(
        skip_all,
        fields(
            city = %city,
            from = %from,
            gql.name = "availableCars",
            otel.name = Self::SPAN_NAME,
            to = %to,
        ),
    )]
    pub async fn available_cars(
        city: String,
        from: Date,
        to: Date,
        ctx: &Context,
    ) -> Result<Vec<api::Car>, Error> {
        let city = validation::city(&city)
            .and_then(|c| validation::period(&from, &to).map(|()| c))
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::car::List::by(read::car::Filter {
                owner_email: None,
                offer: Some(read::car::Offer {
                    city,
                    from: from.coerce(),
                    to: to.coerce(),
                }),
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|cs| cs.into_iter().map(Into::into).collect())
    }

    /// Fetches `Ticket`s, marking the overdue ones as expired first.
    ///
    /// Returns the `Ticket`s booked by the current user, or the ones booking
    /// the current renter's cars if `asRenter` is `true`. Administrators see
    /// all the `Ticket`s unless `asRenter` is specified.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - `asRenter` is specified by a customer.
    #[tracing::instrument(
        skip_all,
        fields(
            as_renter = ?as_renter,
            gql.name = "tickets",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn tickets(
        as_renter: Option<bool>,
        ctx: &Context,
    ) -> Result<Vec<api::Ticket>, Error> {
        let filter = ticket_filter(as_renter, ctx).await?;

        ctx.service()
            .execute(query::ticket::List::by(filter))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ts| ts.into_iter().map(Into::into).collect())
    }

    /// Counts `Ticket`s, the same way `tickets` lists them.
    #[tracing::instrument(
        skip_all,
        fields(
            as_renter = ?as_renter,
            gql.name = "ticketsCount",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn tickets_count(
        as_renter: Option<bool>,
        ctx: &Context,
    ) -> Result<i32, Error> {
        let filter = ticket_filter(as_renter, ctx).await?;

        ctx.service()
            .execute(query::ticket::TotalCount::by(filter))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches `Review`s of the `Car` with the specified ID.
    #[tracing::instrument(
        skip_all,
        fields(
            car_id = %car_id,
            gql.name = "reviews",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn reviews(
        car_id: api::car::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Review>, Error> {
        ctx.service()
            .execute(query::review::OfCar::by(car_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|rs| rs.into_iter().map(Into::into).collect())
    }
}

/// Resolves the owner [`user::Email`] the current renter may list things by.
///
/// # Errors
///
/// Errors if the current user is neither a renter nor an administrator, or
/// the provided `owner_email` is malformed.
async fn owner_filter(
    owner_email: Option<String>,
    ctx: &Context,
) -> Result<Option<user::Email>, Error> {
    let session = ctx.renter_session().await?;
    if !session.is_admin() {
        return Ok(Some(session.email));
    }
    owner_email
        .map(|e| validation::email("ownerEmail", &e))
        .transpose()
        .map_err(AsError::into_error)
        .map_err(ctx.error())
}

/// Resolves the [`read::ticket::Filter`] the current user may list
/// [`api::Ticket`]s by.
///
/// # Errors
///
/// Errors if the current user is not authenticated, or is a customer asking
/// for the [`api::Ticket`]s of a renter.
async fn ticket_filter(
    as_renter: Option<bool>,
    ctx: &Context,
) -> Result<read::ticket::Filter, Error> {
    Ok(match as_renter {
        Some(true) => read::ticket::Filter {
            user_id: None,
            owner_id: Some(ctx.renter_session().await?.user_id),
        },
        Some(false) => read::ticket::Filter {
            user_id: Some(ctx.current_session().await?.user_id),
            owner_id: None,
        },
        None => {
            let session = ctx.current_session().await?;
            if session.is_admin() {
                read::ticket::Filter::default()
            } else {
                read::ticket::Filter {
                    user_id: Some(session.user_id),
                    owner_id: None,
                }
            }
        }
    })
}

define_error! {
    enum CarError {
        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`Car` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum ListingRequestError {
        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "`ListingRequest` with the specified ID does not exist"]
        NotExists,
    }
}
