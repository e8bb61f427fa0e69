//! [`City`] definitions.

use common::define_kind;

define_kind! {
    #[doc = "City a car is permitted to be driven in."]
    enum City {
        #[doc = "Chennai."]
        Chennai = 1 => "chennai",

        #[doc = "Coimbatore."]
        Coimbatore = 2 => "coimbatore",

        #[doc = "Madurai."]
        Madurai = 3 => "madurai",

        #[doc = "Tiruchirappalli."]
        Trichy = 4 => "trichy",

        #[doc = "Hyderabad."]
        Hyderabad = 5 => "hyderbad",

        #[doc = "Bengaluru."]
        Bangalore = 6 => "banglore",

        #[doc = "Kochi."]
        Kochi = 7 => "kochi",

        #[doc = "Goa."]
        Goa = 8 => "goa",

        #[doc = "Cuddalore."]
        Cuddalore = 9 => "cdm",
    }
}
