//! Validation of raw client input.
//!
//! Every check is a pure function returning a [`Rejection`] naming the
//! offending field, so workflows abort before writing anything.

use std::{fmt, str::FromStr};

use common::{Date, DateOf, DateTime, Money};
use derive_more::Error;
use rust_decimal::Decimal;

use crate::domain::{
    car, document,
    listing_request::{Owner, RequestedDate},
    payment, review, ticket, user, verification,
    vehicle::{
        Doors, FuelType, Model, ModelYear, Passengers, Seats, Transmission,
    },
    City, Document, Vehicle,
};

/// Rejected client input.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Rejection {
    /// Required fields are absent.
    Missing(#[error(not(source))] Vec<&'static str>),

    /// Field value is malformed or out of range.
    Invalid {
        /// Name of the offending field.
        field: &'static str,

        /// Explanation of the violation.
        message: String,
    },
}

impl Rejection {
    /// Creates a new [`Rejection::Invalid`] of the provided `field`.
    #[must_use]
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    /// Returns names of all the fields this [`Rejection`] is about.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            Self::Missing(fields) => fields.clone(),
            Self::Invalid { field, .. } => vec![field],
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(fields) => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            Self::Invalid { field, message } => {
                write!(f, "Invalid `{field}`: {message}")
            }
        }
    }
}

/// Checks that every one of the provided `fields` is present.
///
/// # Errors
///
/// [`Rejection::Missing`] enumerating all the absent fields.
pub fn presence(fields: &[(&'static str, bool)]) -> Result<(), Rejection> {
    let missing = fields
        .iter()
        .filter_map(|(name, present)| (!present).then_some(*name))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Rejection::Missing(missing))
    }
}

/// Indicates whether the provided raw text is present and not blank.
#[must_use]
pub fn filled(text: Option<&String>) -> bool {
    text.is_some_and(|t| !t.trim().is_empty())
}

/// Unwraps the provided required `value`.
///
/// # Errors
///
/// [`Rejection::Missing`] if the `value` is absent.
pub fn required<T>(
    field: &'static str,
    value: Option<T>,
) -> Result<T, Rejection> {
    value.ok_or_else(|| Rejection::Missing(vec![field]))
}

/// Validates a car registration number.
///
/// # Errors
///
/// If the number doesn't match the `AB-1234` format once upper-cased.
pub fn car_number(raw: &str) -> Result<car::Number, Rejection> {
    car::Number::parse(raw).ok_or_else(|| {
        Rejection::invalid(
            "carNumber",
            "must be two letters, a hyphen and four digits, like `AB-1234`",
        )
    })
}

/// Validates an email address.
///
/// # Errors
///
/// If the address is malformed.
pub fn email(field: &'static str, raw: &str) -> Result<user::Email, Rejection> {
    user::Email::parse(raw).ok_or_else(|| {
        Rejection::invalid(field, "must be a valid email address")
    })
}

/// Validates a phone number.
///
/// # Errors
///
/// If the number doesn't consist of exactly 10 digits.
pub fn phone(raw: &str) -> Result<user::Phone, Rejection> {
    user::Phone::new(raw.trim())
        .ok_or_else(|| Rejection::invalid("phone", "must be exactly 10 digits"))
}

/// Validates a person name.
///
/// # Errors
///
/// If the name is blank or too long.
pub fn name(raw: &str) -> Result<user::Name, Rejection> {
    user::Name::new(raw.trim()).ok_or_else(|| {
        Rejection::invalid("name", "must be 1 to 512 characters long")
    })
}

/// Validates a car model name.
///
/// # Errors
///
/// If the name is blank or too long.
pub fn model(raw: &str) -> Result<Model, Rejection> {
    Model::new(raw.trim()).ok_or_else(|| {
        Rejection::invalid("carModel", "must be 1 to 128 characters long")
    })
}

/// Validates a model year against the provided `today`.
///
/// # Errors
///
/// If the year is before 1900 or after the next year.
pub fn model_year(year: i32, today: Date) -> Result<ModelYear, Rejection> {
    ModelYear::new(year, today).ok_or_else(|| {
        Rejection::invalid(
            "modelYear",
            format!(
                "must be between {} and {}",
                ModelYear::MIN,
                today.year() + 1,
            ),
        )
    })
}

/// Validates a number of seats.
///
/// # Errors
///
/// If the number is out of range.
pub fn seats(n: i32) -> Result<Seats, Rejection> {
    Seats::new(n).ok_or_else(|| out_of_range("seats", &Seats::RANGE))
}

/// Validates a number of passengers.
///
/// # Errors
///
/// If the number is out of range.
pub fn passengers(n: i32) -> Result<Passengers, Rejection> {
    Passengers::new(n)
        .ok_or_else(|| out_of_range("passengers", &Passengers::RANGE))
}

/// Validates a number of doors.
///
/// # Errors
///
/// If the number is out of range.
pub fn doors(n: i32) -> Result<Doors, Rejection> {
    Doors::new(n).ok_or_else(|| out_of_range("doors", &Doors::RANGE))
}

/// Validates a transmission kind.
///
/// # Errors
///
/// If the value is not one of the known kinds.
pub fn transmission(raw: &str) -> Result<Transmission, Rejection> {
    one_of("transmission", raw.trim(), Transmission::ALL, |t| t.as_str())
}

/// Validates a fuel type.
///
/// # Errors
///
/// If the value is not one of the known types.
pub fn fuel_type(raw: &str) -> Result<FuelType, Rejection> {
    one_of("fuelType", raw.trim(), FuelType::ALL, |t| t.as_str())
}

/// Validates a permitted city.
///
/// # Errors
///
/// If the value is not one of the served cities.
pub fn city(raw: &str) -> Result<City, Rejection> {
    one_of("permittedCity", raw.trim(), City::ALL, |c| c.as_str())
}

/// Validates a daily rental price.
///
/// # Errors
///
/// If the price is not positive.
pub fn price(amount: Decimal) -> Result<Money, Rejection> {
    let price = Money::inr(amount);
    if price.is_positive() {
        Ok(price)
    } else {
        Err(Rejection::invalid("pricePerDay", "must be greater than 0"))
    }
}

/// Validates a `DD-MM-YYYY` date.
///
/// # Errors
///
/// If the date cannot be parsed.
pub fn date<Of: ?Sized>(
    field: &'static str,
    raw: &str,
) -> Result<DateOf<Of>, Rejection> {
    Date::from_dmy(raw)
        .map(DateOf::coerce)
        .map_err(|_| Rejection::invalid(field, "must be a `DD-MM-YYYY` date"))
}

/// Checks that a period ends strictly after it starts.
///
/// # Errors
///
/// If `to` is not after `from`.
pub fn period<F: PartialOrd<T>, T>(from: &F, to: &T) -> Result<(), Rejection> {
    if from < to {
        Ok(())
    } else {
        Err(Rejection::invalid("to", "must be after `from`"))
    }
}

/// Builds a [`Rejection`] for a number out of the provided `range`.
fn out_of_range<T: fmt::Display>(
    field: &'static str,
    range: &std::ops::RangeInclusive<T>,
) -> Rejection {
    Rejection::invalid(
        field,
        format!("must be between {} and {}", range.start(), range.end()),
    )
}

/// Parses one of the provided `options` out of its exact textual form.
fn one_of<T: Copy + FromStr>(
    field: &'static str,
    raw: &str,
    options: &[T],
    repr: impl Fn(T) -> &'static str,
) -> Result<T, Rejection> {
    T::from_str(raw).map_err(|_| {
        let options = options.iter().map(|o| repr(*o)).collect::<Vec<_>>();
        Rejection::invalid(
            field,
            format!("must be one of: {}", options.join(", ")),
        )
    })
}

/// Picks one uploaded [`Document`] of each of the provided `kinds`, in the
/// same order.
///
/// # Errors
///
/// [`Rejection::Missing`] enumerating all the absent kinds, or
/// [`Rejection::Invalid`] if a [`Document`] is empty or of an unacceptable
/// content type.
pub fn documents(
    mut uploaded: Vec<Document>,
    kinds: &[document::Kind],
) -> Result<Vec<Document>, Rejection> {
    presence(
        &kinds
            .iter()
            .map(|k| (k.as_str(), uploaded.iter().any(|d| d.kind == *k)))
            .collect::<Vec<_>>(),
    )?;

    kinds
        .iter()
        .map(|kind| {
            let field = kind.as_str();
            let at = uploaded
                .iter()
                .position(|d| d.kind == *kind)
                .ok_or_else(|| Rejection::Missing(vec![field]))?;
            let doc = uploaded.swap_remove(at);
            if doc.bytes.is_empty() {
                return Err(Rejection::invalid(field, "must not be empty"));
            }
            if !kind.accepts(&doc.content_type) {
                return Err(Rejection::invalid(
                    field,
                    format!("`{}` files are not accepted", doc.content_type),
                ));
            }
            Ok(doc)
        })
        .collect()
}

/// Listing fields as submitted by a renter.
#[derive(Clone, Debug, Default)]
pub struct ListingForm {
    /// Owner name.
    pub name: Option<String>,

    /// Owner email.
    pub email: Option<String>,

    /// Owner phone.
    pub phone: Option<String>,

    /// Car model name.
    pub car_model: Option<String>,

    /// Car registration number.
    pub car_number: Option<String>,

    /// Model year.
    pub model_year: Option<i32>,

    /// Air conditioning indicator.
    pub air_conditioning: Option<bool>,

    /// Number of passengers.
    pub passengers: Option<i32>,

    /// Number of seats.
    pub seats: Option<i32>,

    /// Number of doors.
    pub doors: Option<i32>,

    /// Transmission kind.
    pub transmission: Option<String>,

    /// Fuel type.
    pub fuel_type: Option<String>,

    /// Daily price.
    pub price_per_day: Option<Decimal>,

    /// Start of availability, `DD-MM-YYYY`.
    pub from: Option<String>,

    /// End of availability, `DD-MM-YYYY`.
    pub to: Option<String>,

    /// Permitted city.
    pub permitted_city: Option<String>,
}

/// Validated [`ListingForm`].
#[derive(Clone, Debug)]
pub struct ListingDraft {
    /// Car registration number.
    pub car_number: car::Number,

    /// Owner contact details.
    pub owner: Owner,

    /// Car characteristics.
    pub vehicle: Vehicle,

    /// Start of availability.
    pub available_from: RequestedDate,

    /// End of availability.
    pub available_to: RequestedDate,

    /// Permitted city.
    pub city: City,
}

impl ListingForm {
    /// Validates this [`ListingForm`] as of the provided `today`.
    ///
    /// # Errors
    ///
    /// [`Rejection`] of the first violated constraint, or of all the missing
    /// fields.
    pub fn validate(self, today: Date) -> Result<ListingDraft, Rejection> {
        presence(&[
            ("name", filled(self.name.as_ref())),
            ("email", filled(self.email.as_ref())),
            ("phone", filled(self.phone.as_ref())),
            ("carModel", filled(self.car_model.as_ref())),
            ("carNumber", filled(self.car_number.as_ref())),
            ("modelYear", self.model_year.is_some()),
            ("ac", self.air_conditioning.is_some()),
            ("passengers", self.passengers.is_some()),
            ("seats", self.seats.is_some()),
            ("doors", self.doors.is_some()),
            ("transmission", filled(self.transmission.as_ref())),
            ("fuelType", filled(self.fuel_type.as_ref())),
            ("pricePerDay", self.price_per_day.is_some()),
            ("from", filled(self.from.as_ref())),
            ("to", filled(self.to.as_ref())),
            ("permittedCity", filled(self.permitted_city.as_ref())),
        ])?;

        let car_number = car_number(&required("carNumber", self.car_number)?)?;
        let owner = Owner {
            name: name(&required("name", self.name)?)?,
            email: email("email", &required("email", self.email)?)?,
            phone: phone(&required("phone", self.phone)?)?,
        };
        let vehicle = Vehicle {
            model: model(&required("carModel", self.car_model)?)?,
            year: model_year(required("modelYear", self.model_year)?, today)?,
            seats: seats(required("seats", self.seats)?)?,
            doors: doors(required("doors", self.doors)?)?,
            passengers: passengers(required("passengers", self.passengers)?)?,
            transmission: transmission(&required(
                "transmission",
                self.transmission,
            )?)?,
            fuel: fuel_type(&required("fuelType", self.fuel_type)?)?,
            air_conditioning: required("ac", self.air_conditioning)?,
            price_per_day: price(required("pricePerDay", self.price_per_day)?)?,
        };

        let from = required("from", self.from)?;
        let to = required("to", self.to)?;
        period(&date::<()>("from", &from)?, &date::<()>("to", &to)?)?;

        let city = city(&required("permittedCity", self.permitted_city)?)?;

        #[expect(unsafe_code, reason = "dates are validated above")]
        let (available_from, available_to) = unsafe {
            (
                RequestedDate::new_unchecked(from.trim()),
                RequestedDate::new_unchecked(to.trim()),
            )
        };

        Ok(ListingDraft {
            car_number,
            owner,
            vehicle,
            available_from,
            available_to,
            city,
        })
    }
}

/// Car fields as entered on the dashboard.
#[derive(Clone, Debug, Default)]
pub struct CarForm {
    /// Owner email.
    pub email: Option<String>,

    /// Car model name.
    pub car_model: Option<String>,

    /// Car registration number.
    pub car_number: Option<String>,

    /// Model year.
    pub model_year: Option<i32>,

    /// Air conditioning indicator.
    pub air_conditioning: Option<bool>,

    /// Number of passengers.
    pub passengers: Option<i32>,

    /// Number of seats.
    pub seats: Option<i32>,

    /// Number of doors.
    pub doors: Option<i32>,

    /// Transmission kind.
    pub transmission: Option<String>,

    /// Fuel type.
    pub fuel_type: Option<String>,

    /// Daily price.
    pub price_per_day: Option<Decimal>,

    /// Start of availability, `DD-MM-YYYY`.
    pub from: Option<String>,

    /// End of availability, `DD-MM-YYYY`.
    pub to: Option<String>,

    /// Permitted city.
    pub permitted_city: Option<String>,
}

/// Validated [`CarForm`].
#[derive(Clone, Debug)]
pub struct CarDraft {
    /// Car registration number.
    pub number: car::Number,

    /// Owner email.
    pub owner_email: user::Email,

    /// Car characteristics.
    pub vehicle: Vehicle,

    /// Start of availability.
    pub available_from: car::AvailableFrom,

    /// End of availability.
    pub available_to: car::AvailableTo,

    /// Permitted city.
    pub city: City,
}

impl CarForm {
    /// Validates this [`CarForm`] as of the provided `today`.
    ///
    /// # Errors
    ///
    /// [`Rejection`] of the first violated constraint, or of all the missing
    /// fields.
    pub fn validate(self, today: Date) -> Result<CarDraft, Rejection> {
        presence(&[
            ("email", filled(self.email.as_ref())),
            ("carModel", filled(self.car_model.as_ref())),
            ("carNumber", filled(self.car_number.as_ref())),
            ("modelYear", self.model_year.is_some()),
            ("ac", self.air_conditioning.is_some()),
            ("passengers", self.passengers.is_some()),
            ("seats", self.seats.is_some()),
            ("doors", self.doors.is_some()),
            ("transmission", filled(self.transmission.as_ref())),
            ("fuelType", filled(self.fuel_type.as_ref())),
            ("pricePerDay", self.price_per_day.is_some()),
            ("from", filled(self.from.as_ref())),
            ("to", filled(self.to.as_ref())),
            ("permittedCity", filled(self.permitted_city.as_ref())),
        ])?;

        let number = car_number(&required("carNumber", self.car_number)?)?;
        let owner_email = email("email", &required("email", self.email)?)?;
        let vehicle = Vehicle {
            model: model(&required("carModel", self.car_model)?)?,
            year: model_year(required("modelYear", self.model_year)?, today)?,
            seats: seats(required("seats", self.seats)?)?,
            doors: doors(required("doors", self.doors)?)?,
            passengers: passengers(required("passengers", self.passengers)?)?,
            transmission: transmission(&required(
                "transmission",
                self.transmission,
            )?)?,
            fuel: fuel_type(&required("fuelType", self.fuel_type)?)?,
            air_conditioning: required("ac", self.air_conditioning)?,
            price_per_day: price(required("pricePerDay", self.price_per_day)?)?,
        };
        let available_from: car::AvailableFrom =
            date("from", &required("from", self.from)?)?;
        let available_to: car::AvailableTo =
            date("to", &required("to", self.to)?)?;
        period(&available_from.coerce::<()>(), &available_to.coerce::<()>())?;
        let city = city(&required("permittedCity", self.permitted_city)?)?;

        Ok(CarDraft {
            number,
            owner_email,
            vehicle,
            available_from,
            available_to,
            city,
        })
    }
}

/// Partial car edit as entered on the dashboard.
#[derive(Clone, Debug, Default)]
pub struct CarEdit {
    /// New car registration number.
    pub car_number: Option<String>,

    /// New car model name.
    pub car_model: Option<String>,

    /// New model year.
    pub model_year: Option<i32>,

    /// New air conditioning indicator.
    pub air_conditioning: Option<bool>,

    /// New number of passengers.
    pub passengers: Option<i32>,

    /// New number of seats.
    pub seats: Option<i32>,

    /// New number of doors.
    pub doors: Option<i32>,

    /// New transmission kind.
    pub transmission: Option<String>,

    /// New fuel type.
    pub fuel_type: Option<String>,

    /// New daily price.
    pub price_per_day: Option<Decimal>,

    /// New start of availability, `DD-MM-YYYY`.
    pub from: Option<String>,

    /// New end of availability, `DD-MM-YYYY`.
    pub to: Option<String>,

    /// New permitted city.
    pub permitted_city: Option<String>,
}

impl CarEdit {
    /// Validates every present field of this [`CarEdit`] as of the provided
    /// `today`.
    ///
    /// The resulting [`car::Changes`] never replace the image.
    ///
    /// # Errors
    ///
    /// [`Rejection`] of the first violated constraint.
    pub fn validate(self, today: Date) -> Result<car::Changes, Rejection> {
        Ok(car::Changes {
            number: self.car_number.as_deref().map(car_number).transpose()?,
            model: self.car_model.as_deref().map(model).transpose()?,
            year: self
                .model_year
                .map(|y| model_year(y, today))
                .transpose()?,
            seats: self.seats.map(seats).transpose()?,
            doors: self.doors.map(doors).transpose()?,
            passengers: self.passengers.map(passengers).transpose()?,
            transmission: self
                .transmission
                .as_deref()
                .map(transmission)
                .transpose()?,
            fuel: self.fuel_type.as_deref().map(fuel_type).transpose()?,
            air_conditioning: self.air_conditioning,
            price_per_day: self.price_per_day.map(price).transpose()?,
            image: None,
            available_from: self
                .from
                .as_deref()
                .map(|d| date("from", d))
                .transpose()?,
            available_to: self
                .to
                .as_deref()
                .map(|d| date("to", d))
                .transpose()?,
            city: self.permitted_city.as_deref().map(city).transpose()?,
        })
    }
}

/// Booking fields as submitted by a customer.
#[derive(Clone, Debug, Default)]
pub struct BookingForm {
    /// Registration number of the car to book.
    pub car_number: Option<String>,

    /// ID of the car owner.
    pub owner_id: Option<user::Id>,

    /// Pick-up location.
    pub location: Option<String>,

    /// Permitted city.
    pub permitted_city: Option<String>,

    /// Start of the booking.
    pub from: Option<DateTime>,

    /// End of the booking.
    pub to: Option<DateTime>,

    /// Charged amount.
    pub amount: Option<Decimal>,

    /// Payment made for the booking, if any.
    pub payment_id: Option<String>,
}

/// Validated [`BookingForm`].
#[derive(Clone, Debug)]
pub struct BookingDraft {
    /// Registration number of the car to book.
    pub car_number: car::Number,

    /// ID of the car owner.
    pub owner_id: user::Id,

    /// Pick-up location.
    pub location: ticket::Location,

    /// Permitted city.
    pub city: City,

    /// Start of the booking.
    pub from: ticket::StartDateTime,

    /// End of the booking.
    pub to: ticket::EndDateTime,

    /// Charged amount.
    pub amount: Money,

    /// Payment made for the booking, if any.
    pub payment: Option<payment::Reference>,
}

impl BookingForm {
    /// Validates this [`BookingForm`].
    ///
    /// # Errors
    ///
    /// [`Rejection`] of the first violated constraint, or of all the missing
    /// fields.
    pub fn validate(self) -> Result<BookingDraft, Rejection> {
        presence(&[
            ("carNumber", filled(self.car_number.as_ref())),
            ("ownerId", self.owner_id.is_some()),
            ("location", filled(self.location.as_ref())),
            ("permittedCity", filled(self.permitted_city.as_ref())),
            ("from", self.from.is_some()),
            ("to", self.to.is_some()),
            ("amount", self.amount.is_some()),
        ])?;

        let car_number = car_number(&required("carNumber", self.car_number)?)?;
        let location =
            ticket::Location::new(required("location", self.location)?)
                .ok_or_else(|| {
                    Rejection::invalid("location", "must not be blank")
                })?;
        let city = city(&required("permittedCity", self.permitted_city)?)?;
        let from = required("from", self.from)?;
        let to = required("to", self.to)?;
        period(&from, &to)?;
        let amount = Money::inr(required("amount", self.amount)?);
        if amount.minor_units().is_none() {
            return Err(Rejection::invalid(
                "amount",
                "must be a non-negative amount with at most 2 decimals",
            ));
        }

        Ok(BookingDraft {
            car_number,
            owner_id: required("ownerId", self.owner_id)?,
            location,
            city,
            from: from.coerce(),
            to: to.coerce(),
            amount,
            payment: self
                .payment_id
                .map(|p| p.trim().to_owned())
                .filter(|p| !p.is_empty())
                .map(payment::Reference::from),
        })
    }
}

/// Review fields as submitted by a customer.
#[derive(Clone, Debug, Default)]
pub struct ReviewForm {
    /// Rating from 0 to 5.
    pub rating: Option<i32>,

    /// Free text.
    pub review: Option<String>,
}

impl ReviewForm {
    /// Validates this [`ReviewForm`].
    ///
    /// # Errors
    ///
    /// [`Rejection`] of the first violated constraint, or of all the missing
    /// fields.
    pub fn validate(self) -> Result<(review::Rating, review::Text), Rejection> {
        presence(&[
            ("rating", self.rating.is_some()),
            ("review", filled(self.review.as_ref())),
        ])?;

        let rating = review::Rating::new(required("rating", self.rating)?)
            .ok_or_else(|| {
                out_of_range("rating", &(0..=review::Rating::MAX))
            })?;
        let text = review::Text::new(required("review", self.review)?)
            .ok_or_else(|| {
                Rejection::invalid("review", "must be at most 4096 characters")
            })?;
        Ok((rating, text))
    }
}

/// Registration fields awaiting an email confirmation.
#[derive(Clone, Debug, Default)]
pub struct RegistrationForm {
    /// Name of the registering user.
    pub name: Option<String>,

    /// Email of the registering user.
    pub email: Option<String>,

    /// Phone of the registering user.
    pub phone: Option<String>,
}

impl RegistrationForm {
    /// Validates this [`RegistrationForm`].
    ///
    /// # Errors
    ///
    /// [`Rejection`] of the first violated constraint, or of all the missing
    /// fields.
    pub fn validate(self) -> Result<verification::Registration, Rejection> {
        presence(&[
            ("name", filled(self.name.as_ref())),
            ("email", filled(self.email.as_ref())),
            ("phone", filled(self.phone.as_ref())),
        ])?;

        Ok(verification::Registration {
            name: name(&required("name", self.name)?)?,
            email: email("email", &required("email", self.email)?)?,
            phone: phone(&required("phone", self.phone)?)?,
        })
    }
}

#[cfg(test)]
mod spec {
    use common::Date;
    use rust_decimal::Decimal;

    use crate::domain::{document::Kind, vehicle::FuelType, City, Document};

    use super::{
        documents, CarEdit, ListingForm, Rejection, RegistrationForm,
        ReviewForm,
    };

    fn today() -> Date {
        Date::from_dmy("15-06-2025").unwrap()
    }

    fn form() -> ListingForm {
        ListingForm {
            name: Some("Kavin".into()),
            email: Some("kavin@example.com".into()),
            phone: Some("9876543210".into()),
            car_model: Some("Swift".into()),
            car_number: Some(" ab-1234 ".into()),
            model_year: Some(2022),
            air_conditioning: Some(true),
            passengers: Some(5),
            seats: Some(5),
            doors: Some(4),
            transmission: Some("Manual".into()),
            fuel_type: Some("Petrol".into()),
            price_per_day: Some(Decimal::from(1500)),
            from: Some("01-01-2025".into()),
            to: Some("05-01-2025".into()),
            permitted_city: Some("chennai".into()),
        }
    }

    fn rejected_field(form: ListingForm) -> &'static str {
        match form.validate(today()) {
            Err(Rejection::Invalid { field, .. }) => field,
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_form() {
        let draft = form().validate(today()).unwrap();

        assert_eq!(AsRef::<str>::as_ref(&draft.car_number), "AB-1234");
        assert_eq!(draft.city, City::Chennai);
        assert_eq!(draft.vehicle.fuel, FuelType::Petrol);
        assert_eq!(AsRef::<str>::as_ref(&draft.available_from), "01-01-2025");
    }

    #[test]
    fn enumerates_missing_fields() {
        let err = ListingForm {
            phone: None,
            car_model: Some("  ".into()),
            doors: None,
            ..form()
        }
        .validate(today())
        .unwrap_err();

        assert_eq!(err, Rejection::Missing(vec!["phone", "carModel", "doors"]));
        assert_eq!(
            err.to_string(),
            "Missing required fields: phone, carModel, doors",
        );
    }

    #[test]
    fn names_offending_field() {
        let cases: [(fn(&mut ListingForm), &str); 15] = [
            (|f| f.car_number = Some("AB1234".into()), "carNumber"),
            (|f| f.email = Some("kavin@".into()), "email"),
            (|f| f.phone = Some("12345".into()), "phone"),
            (|f| f.fuel_type = Some("petrol".into()), "fuelType"),
            (|f| f.transmission = Some("CVT".into()), "transmission"),
            (|f| f.permitted_city = Some("mumbai".into()), "permittedCity"),
            (|f| f.passengers = Some(9), "passengers"),
            (|f| f.seats = Some(0), "seats"),
            (|f| f.doors = Some(7), "doors"),
            (|f| f.model_year = Some(2027), "modelYear"),
            (|f| f.model_year = Some(1899), "modelYear"),
            (|f| f.price_per_day = Some(Decimal::ZERO), "pricePerDay"),
            (|f| f.from = Some("2025-01-01".into()), "from"),
            (|f| f.to = Some("01-01-2025".into()), "to"),
            (|f| f.to = Some("31-12-2024".into()), "to"),
        ];

        for (tamper, field) in cases {
            let mut f = form();
            tamper(&mut f);
            assert_eq!(rejected_field(f), field);
        }
    }

    #[test]
    fn edit_validates_only_present_fields() {
        let changes = CarEdit {
            price_per_day: Some(Decimal::from(2000)),
            permitted_city: Some("goa".into()),
            ..CarEdit::default()
        }
        .validate(today())
        .unwrap();

        assert_eq!(changes.city, Some(City::Goa));
        assert!(changes.model.is_none());
        assert!(changes.available_from.is_none());

        let err = CarEdit {
            doors: Some(1),
            ..CarEdit::default()
        }
        .validate(today())
        .unwrap_err();
        assert_eq!(err.fields(), vec!["doors"]);
    }

    fn upload(kind: Kind, content_type: &str) -> Document {
        Document {
            kind,
            file_name: "scan".into(),
            content_type: content_type.into(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn picks_documents_in_order() {
        let picked = documents(
            vec![
                upload(Kind::Registration, "application/pdf"),
                upload(Kind::Image, "image/png"),
                upload(Kind::Insurance, "application/pdf"),
            ],
            &[Kind::Image, Kind::Insurance, Kind::Registration],
        )
        .unwrap();

        let kinds = picked.iter().map(|d| d.kind).collect::<Vec<_>>();
        assert_eq!(kinds, [Kind::Image, Kind::Insurance, Kind::Registration]);
    }

    #[test]
    fn rejects_absent_or_unacceptable_documents() {
        let err = documents(
            vec![upload(Kind::Image, "image/png")],
            &[Kind::Image, Kind::Insurance, Kind::Registration],
        )
        .unwrap_err();
        assert_eq!(err, Rejection::Missing(vec!["insurance", "rc_book"]));

        let err = documents(
            vec![upload(Kind::Image, "application/pdf")],
            &[Kind::Image],
        )
        .unwrap_err();
        assert_eq!(err.fields(), vec!["image"]);

        let empty = Document {
            bytes: Vec::new(),
            ..upload(Kind::Image, "image/png")
        };
        assert_eq!(
            documents(vec![empty], &[Kind::Image]).unwrap_err().fields(),
            vec!["image"],
        );
    }

    #[test]
    fn validates_reviews() {
        let (rating, text) = ReviewForm {
            rating: Some(4),
            review: Some(" Clean and comfy ".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(u8::from(rating), 4);
        assert_eq!(text.to_string(), "Clean and comfy");

        let err = ReviewForm::default().validate().unwrap_err();
        assert_eq!(err, Rejection::Missing(vec!["rating", "review"]));

        for rating in [-1, 6] {
            let err = ReviewForm {
                rating: Some(rating),
                review: Some("Fine".into()),
            }
            .validate()
            .unwrap_err();
            assert_eq!(err.fields(), vec!["rating"]);
        }
    }

    #[test]
    fn validates_registrations() {
        let registration = RegistrationForm {
            name: Some("Kavin".into()),
            email: Some("kavin@example.com".into()),
            phone: Some("9876543210".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(registration.email.to_string(), "kavin@example.com");

        let err = RegistrationForm {
            name: Some("Kavin".into()),
            email: Some("kavin@example.com".into()),
            phone: Some("12345".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.fields(), vec!["phone"]);

        let err = RegistrationForm::default().validate().unwrap_err();
        assert_eq!(err, Rejection::Missing(vec!["name", "email", "phone"]));
    }
}
