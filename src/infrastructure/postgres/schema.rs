diesel::table! {
    bookings (id) {
        id -> Uuid,
        user_id -> Text,
        total_amount_minor -> Int8,
        installment_amount_minor -> Int8,
        remaining_amount_minor -> Int8,
        installments_remaining -> Int4,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    customers (id) {
        id -> Uuid,
        user_id -> Text,
        email -> Text,
        stripe_customer_id -> Nullable<Text>,
        plan -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    payment_records (id) {
        id -> Uuid,
        booking_id -> Uuid,
        amount_minor -> Int8,
        payment_date -> Timestamptz,
        payment_type -> Text,
        payment_intent_id -> Text,
        receipt_number -> Text,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    payment_sessions (id) {
        id -> Uuid,
        user_id -> Text,
        subscription_id -> Text,
        plan_id -> Text,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(payment_records -> bookings (booking_id));

diesel::allow_tables_to_appear_in_same_query!(bookings, customers, payment_records, payment_sessions,);
